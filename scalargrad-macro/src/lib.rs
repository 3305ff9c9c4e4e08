//! `scalargrad!` rewrites a block of plain arithmetic `let` statements into
//! calls that build a `scalargrad::Value` graph.
//!
//! ```ignore
//! scalargrad! {{
//!     let a = -4.;
//!     let z = a * 2. + 2. + a;
//!     let q = relu(z) + z * a;
//! }}
//! q.backprop();
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, spanned::Spanned, BinOp, Block, Expr, ExprLit, Ident, Lit, Pat, Stmt, UnOp,
};

#[proc_macro]
pub fn scalargrad(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as Block);

    let mut objs = vec![];

    for stmt in &input.stmts {
        if let Err(e) = traverse_stmt(stmt, &mut objs) {
            return e.to_compile_error().into();
        }
    }

    let expanded = quote! {
        #(#objs)*
    };

    TokenStream::from(expanded)
}

fn traverse_stmt(input: &Stmt, terms: &mut Vec<TokenStream2>) -> syn::Result<()> {
    match input {
        Stmt::Local(local) => {
            let (Pat::Ident(id), Some(init)) = (&local.pat, &local.init) else {
                return Err(syn::Error::new(
                    local.span(),
                    "expected `let <name> = <expression>;`",
                ));
            };
            let name = id.ident.clone();
            let ts = match &*init.expr {
                ex if literal(ex).is_some() => {
                    let lit = leaf_literal(ex)?;
                    quote! {
                        let #name = ::scalargrad::Value::new(#lit);
                    }
                }
                Expr::Path(path) => quote! {
                    let #name = #path.clone();
                },
                ex => {
                    let res = traverse_expr(ex, terms)?;
                    quote! {
                        let #name = #res;
                    }
                }
            };
            terms.push(ts);
            Ok(())
        }
        Stmt::Expr(ex, _) => traverse_expr(ex, terms).map(|_| ()),
        _ => Err(syn::Error::new(input.span(), "unsupported statement")),
    }
}

fn var_name(terms: &[TokenStream2]) -> String {
    format!("_a{}", terms.len())
}

/// A literal, possibly negated, such as `2.` or `-4.`.
fn literal(ex: &Expr) -> Option<(bool, &ExprLit)> {
    match ex {
        Expr::Lit(lit) => Some((false, lit)),
        Expr::Unary(un) if matches!(un.op, UnOp::Neg(_)) => match &*un.expr {
            Expr::Lit(lit) => Some((true, lit)),
            _ => None,
        },
        _ => None,
    }
}

/// Integer literals are accepted and widened, so `2` and `2.` build the same leaf.
fn leaf_literal(ex: &Expr) -> syn::Result<TokenStream2> {
    let Some((neg, lit)) = literal(ex) else {
        return Err(syn::Error::new(ex.span(), "expected a numeric literal"));
    };
    let value = match &lit.lit {
        Lit::Float(_) => quote! { #lit },
        Lit::Int(_) => quote! { #lit as f64 },
        _ => return Err(syn::Error::new(lit.span(), "expected a numeric literal")),
    };
    if neg {
        Ok(quote! { -#value })
    } else {
        Ok(value)
    }
}

fn format_term(ex: &Expr, terms: &mut Vec<TokenStream2>) -> syn::Result<Ident> {
    let name = Ident::new(&var_name(terms), ex.span());
    let lit = leaf_literal(ex)?;
    let ts = quote! {
        let #name = ::scalargrad::Value::new(#lit);
    };
    terms.push(ts);
    Ok(name)
}

fn push_term(ts: TokenStream2, span: proc_macro2::Span, terms: &mut Vec<TokenStream2>) -> Ident {
    let name = Ident::new(&var_name(terms), span);
    terms.push(quote! {
        let #name = #ts;
    });
    name
}

fn traverse_expr(input: &Expr, terms: &mut Vec<TokenStream2>) -> syn::Result<Ident> {
    if literal(input).is_some() {
        return format_term(input, terms);
    }
    match input {
        Expr::Binary(ex) => {
            let lhs = traverse_expr(&ex.left, terms)?;
            let rhs = traverse_expr(&ex.right, terms)?;
            let binop = match ex.op {
                BinOp::Add(_) => quote! { &#lhs + &#rhs },
                BinOp::Sub(_) => quote! { &#lhs - &#rhs },
                BinOp::Mul(_) => quote! { &#lhs * &#rhs },
                BinOp::Div(_) => quote! { &#lhs / &#rhs },
                _ => return Err(syn::Error::new(ex.op.span(), "unsupported operator")),
            };
            Ok(push_term(binop, ex.span(), terms))
        }
        Expr::Unary(ex) => {
            let term = traverse_expr(&ex.expr, terms)?;
            match ex.op {
                UnOp::Neg(_) => Ok(push_term(quote! { -&#term }, ex.span(), terms)),
                _ => Err(syn::Error::new(ex.span(), "unsupported operator")),
            }
        }
        Expr::Paren(ex) => traverse_expr(&ex.expr, terms),
        Expr::Path(path) => path
            .path
            .get_ident()
            .cloned()
            .ok_or_else(|| syn::Error::new(path.span(), "expected a variable name")),
        // `f(x)` becomes `x.f()`, e.g. `relu(z)`.
        Expr::Call(call) => {
            let (Expr::Path(func), Some(arg), 1) = (&*call.func, call.args.first(), call.args.len())
            else {
                return Err(syn::Error::new(
                    call.span(),
                    "expected a function call with a single argument",
                ));
            };
            let func = func
                .path
                .get_ident()
                .cloned()
                .ok_or_else(|| syn::Error::new(func.span(), "expected a function name"))?;
            let arg = traverse_expr(arg, terms)?;
            Ok(push_term(quote! { #arg.#func() }, call.span(), terms))
        }
        // `x.f()` or `x.f(y)`, where `y` becomes a node passed by reference.
        Expr::MethodCall(call) => {
            let receiver = traverse_expr(&call.receiver, terms)?;
            let method = &call.method;
            let ts = match call.args.len() {
                0 => quote! { #receiver.#method() },
                1 => {
                    let arg = traverse_expr(&call.args[0], terms)?;
                    quote! { #receiver.#method(&#arg) }
                }
                _ => {
                    return Err(syn::Error::new(
                        call.span(),
                        "expected at most one argument",
                    ))
                }
            };
            Ok(push_term(ts, call.span(), terms))
        }
        _ => Err(syn::Error::new(input.span(), "unsupported expression")),
    }
}

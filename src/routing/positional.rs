//! Typed adapters for handlers that take captures as arguments.
//!
//! A positional handler is any `Fn(&mut Context, String, ...)` with up to
//! eight `String` parameters. The number of parameters is known at compile
//! time and checked against the pattern's capture groups when the route is
//! built, so a request never reaches a handler with the wrong argument count.

use super::context::Context;

/// Handler invoked with the context followed by one `String` per capture group.
///
/// `Args` is a marker tuple (`()`, `(String,)`, `(String, String)`, ...) that
/// keeps the implementations for different arities apart.
pub trait PositionalHandler<Args>: Send + Sync + 'static {
    /// Number of `String` parameters after the context.
    const ARITY: usize;

    /// Call the handler. `captures` holds exactly `ARITY` values.
    fn invoke(&self, ctx: &mut Context, captures: Vec<String>);
}

macro_rules! impl_positional_handler {
    ($($arg:ident),*) => {
        impl<F> PositionalHandler<($(impl_positional_handler!(@string $arg),)*)> for F
        where
            F: Fn(&mut Context $(, impl_positional_handler!(@string $arg))*) + Send + Sync + 'static,
        {
            const ARITY: usize = 0 $(+ impl_positional_handler!(@one $arg))*;

            #[allow(unused_mut, unused_variables)]
            fn invoke(&self, ctx: &mut Context, captures: Vec<String>) {
                let mut captures = captures.into_iter();
                $(let $arg = captures.next().unwrap_or_default();)*
                (self)(ctx $(, $arg)*)
            }
        }
    };
    (@string $arg:ident) => { String };
    (@one $arg:ident) => { 1 };
}

impl_positional_handler!();
impl_positional_handler!(a);
impl_positional_handler!(a, b);
impl_positional_handler!(a, b, c);
impl_positional_handler!(a, b, c, d);
impl_positional_handler!(a, b, c, d, e);
impl_positional_handler!(a, b, c, d, e, f);
impl_positional_handler!(a, b, c, d, e, f, g);
impl_positional_handler!(a, b, c, d, e, f, g, h);

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Request;

    fn arity<H: PositionalHandler<Args>, Args>(_h: &H) -> usize {
        H::ARITY
    }

    fn two(ctx: &mut Context, first: String, second: String) {
        ctx.write(format!("{first}+{second}"));
    }

    #[test]
    fn test_arity_is_parameter_count() {
        assert_eq!(arity(&|_ctx: &mut Context| {}), 0);
        assert_eq!(arity(&|_ctx: &mut Context, _a: String| {}), 1);
        assert_eq!(arity(&two), 2);
        assert_eq!(
            arity(&|_ctx: &mut Context, _a: String, _b: String, _c: String, _d: String, _e: String, _f: String, _g: String, _h: String| {}),
            8
        );
    }

    #[test]
    fn test_invoke_passes_captures_in_order() {
        let mut ctx = Context::new(Request::builder().uri("/").body(Bytes::new()).unwrap());
        two.invoke(&mut ctx, vec!["foo".into(), "bar".into()]);
        assert_eq!(ctx.response().body(), b"foo+bar");
    }
}

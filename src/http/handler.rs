use futures_util::future::BoxFuture;

use crate::http::request::Request;
use crate::http::response::Response;

/// Turns one request into one response.
///
/// The response may borrow the request body (e.g. to echo it back); the
/// connection driver drains whatever the handler leaves unread. Returning an
/// [`HttpError`](crate::error::HttpError) sends that status and closes the
/// connection; any other error sends a 500 and is reported.
pub trait Handler: Send + Sync {
    fn handle<'a>(&'a self, request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>>;
}

/// Plain functions work as handlers:
///
/// ```ignore
/// fn hello<'a>(request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> {
///     Box::pin(async move { Ok(Response::ok(&request.head, BodyReader::from_bytes("hi"))) })
/// }
/// ```
impl<F> Handler for F
where
    F: for<'a> Fn(Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> + Send + Sync,
{
    fn handle<'a>(&'a self, request: Request<'a>) -> BoxFuture<'a, anyhow::Result<Response<'a>>> {
        self(request)
    }
}

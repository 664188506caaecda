//! End-to-end tests of the built-in middleware working together.
//!
//! The application chain used throughout is:
//!
//! 1. Request ID - Generate/propagate request ID
//! 2. Access log - Request span and completion log
//! 3. Error Normalization - Error envelope conversion
//!
//! followed by optional group middleware and the route handler.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, StatusCode};
use slide_core::{
    boxed, AppConfig, BoxFuture, BoxedHandler, Chain, Ctx, Exchange, SlideError, SlideResult,
};
use slide_middleware::{
    request_id, AccessLogMiddleware, ErrorNormalizationMiddleware, RequestIdMiddleware,
    REQUEST_ID_HEADER,
};
use slide_router::RoutePattern;

fn app_middleware() -> Vec<BoxedHandler> {
    vec![
        boxed(RequestIdMiddleware::new()),
        boxed(AccessLogMiddleware::new()),
        boxed(ErrorNormalizationMiddleware::new()),
    ]
}

async fn dispatch(
    group: &[BoxedHandler],
    handler: BoxedHandler,
    pattern: &str,
    uri: &str,
) -> (Ctx, SlideResult<()>) {
    let chain = Chain::new(&app_middleware(), group, handler);
    let request = http::Request::get(uri).body(Bytes::new()).unwrap();
    let mut ctx = Ctx::new(
        Exchange::new(request),
        Arc::new(RoutePattern::parse(pattern)),
        Some(Arc::new(chain)),
        Arc::new(AppConfig::new()),
    );
    let result = ctx.next().await;
    (ctx, result)
}

fn body_json(ctx: &Ctx) -> serde_json::Value {
    let body = ctx.response_body().as_bytes().cloned().unwrap_or_default();
    serde_json::from_slice(&body).unwrap()
}

fn greet(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
    Box::pin(async move {
        let name = ctx.param("name").to_string();
        let lang = ctx.query_param("lang").to_string();
        ctx.json(
            StatusCode::OK,
            &serde_json::json!({ "name": name, "lang": lang }),
        )
    })
}

fn explode(_ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
    Box::pin(async { Err(SlideError::internal("boom")) })
}

fn require_token(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
    Box::pin(async move {
        if ctx.header(header::AUTHORIZATION).is_none() {
            return ctx.send(StatusCode::UNAUTHORIZED, "missing token");
        }
        ctx.next().await
    })
}

#[tokio::test]
async fn successful_request_flows_through_every_stage() {
    let (ctx, result) = dispatch(&[], boxed(greet), "/hello/:name", "/hello/slide?lang=en").await;

    result.unwrap();
    assert_eq!(ctx.status(), StatusCode::OK);
    assert!(ctx.exchange().headers().contains_key(REQUEST_ID_HEADER));
    assert!(request_id(&ctx).is_some());

    let json = body_json(&ctx);
    assert_eq!(json["name"], "slide");
    assert_eq!(json["lang"], "en");
}

#[tokio::test]
async fn handler_error_becomes_envelope_with_request_id() {
    let (ctx, result) = dispatch(&[], boxed(explode), "/boom", "/boom").await;

    result.unwrap();
    assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(&ctx);
    assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
    let id = request_id(&ctx).unwrap().to_string();
    assert_eq!(json["error"]["request_id"], id.as_str());
    assert_eq!(ctx.exchange().headers()[REQUEST_ID_HEADER], id.as_str());
}

#[tokio::test]
async fn group_middleware_short_circuit_keeps_its_response() {
    let (ctx, result) = dispatch(
        &[boxed(require_token)],
        boxed(greet),
        "/hello/:name",
        "/hello/slide",
    )
    .await;

    result.unwrap();
    assert_eq!(ctx.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        ctx.response_body().as_bytes().map(|b| &b[..]),
        Some(&b"missing token"[..])
    );
    assert_eq!(ctx.app_cursor(), 3);
    assert_eq!(ctx.group_cursor(), 1);
    // The app middleware still ran around the short circuit.
    assert!(ctx.exchange().headers().contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn continuation_misuse_is_normalized() {
    fn twice(ctx: &mut Ctx) -> BoxFuture<'_, SlideResult<()>> {
        Box::pin(async move {
            ctx.next().await?;
            ctx.next().await
        })
    }

    let (ctx, result) = dispatch(&[boxed(twice)], boxed(greet), "/hello/:name", "/hello/x").await;

    result.unwrap();
    assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(&ctx)["error"]["code"], "CONTINUATION_MISUSE");
}

#[tokio::test]
async fn envelope_outside_request_id_keeps_header() {
    let middleware = [
        boxed(ErrorNormalizationMiddleware::new()),
        boxed(RequestIdMiddleware::new()),
    ];
    let chain = Chain::new(&middleware, &[], boxed(explode));
    let request = http::Request::get("/boom").body(Bytes::new()).unwrap();
    let mut ctx = Ctx::new(
        Exchange::new(request),
        Arc::new(RoutePattern::parse("/boom")),
        Some(Arc::new(chain)),
        Arc::new(AppConfig::new()),
    );

    ctx.next().await.unwrap();
    assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let id = request_id(&ctx).unwrap().to_string();
    assert_eq!(ctx.exchange().headers()[REQUEST_ID_HEADER], id.as_str());
    assert_eq!(body_json(&ctx)["error"]["request_id"], id.as_str());
}

#[tokio::test]
async fn escaping_error_written_afterwards_keeps_header() {
    let middleware = [boxed(RequestIdMiddleware::new())];
    let chain = Chain::new(&middleware, &[], boxed(explode));
    let request = http::Request::get("/boom").body(Bytes::new()).unwrap();
    let mut ctx = Ctx::new(
        Exchange::new(request),
        Arc::new(RoutePattern::parse("/boom")),
        Some(Arc::new(chain)),
        Arc::new(AppConfig::new()),
    );

    let err = ctx.next().await.unwrap_err();
    slide_middleware::write_error(&mut ctx, &err, false).unwrap();

    assert_eq!(ctx.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let id = request_id(&ctx).unwrap().to_string();
    assert_eq!(ctx.exchange().headers()[REQUEST_ID_HEADER], id.as_str());
    assert_eq!(
        ctx.exchange().headers()[header::CONTENT_TYPE],
        "application/json"
    );
}

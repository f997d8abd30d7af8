use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;
use std::time::Instant;

/// Per-request access log: method, path, status and latency.
///
/// Query strings and headers are not logged; they may carry credentials.
pub struct RequestLogger;

impl<S, B> Transform<S, ServiceRequest> for RequestLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestLoggerService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequestLoggerService {
            service: Rc::new(service),
        }))
    }
}

pub struct RequestLoggerService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequestLoggerService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start_time = Instant::now();
        let method = req.method().to_string();
        let path = req.path().to_string();

        tracing::debug!(%method, %path, "Request started");

        let service = self.service.clone();

        Box::pin(async move {
            let result = service.call(req).await;

            // Errors raised by inner middleware still reach the client as a
            // response, so they are logged with the status they render to.
            let status = match &result {
                Ok(res) => res.status(),
                Err(e) => e.as_response_error().status_code(),
            };

            tracing::info!(
                %method,
                %path,
                status = status.as_u16(),
                elapsed_ms = start_time.elapsed().as_millis() as u64,
                failed = result.is_err(),
                "Request completed"
            );

            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    use crate::auth::SessionManager;
    use crate::middleware::JwtMiddleware;
    use crate::store::InMemoryStore;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[actix_web::test]
    async fn test_requests_rejected_by_inner_middleware_are_logged() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let sessions = SessionManager::new(Arc::new(InMemoryStore::new()), "logger-test-secret");
        let app = test::init_service(
            App::new().wrap(RequestLogger).service(
                web::scope("/protected")
                    .wrap(JwtMiddleware::new(sessions))
                    .route("", web::get().to(|| async { HttpResponse::Ok().finish() })),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/protected").to_request();
        let result = app.call(req).await;

        let err = result.err().expect("Request without a token should fail");
        assert_eq!(err.as_response_error().status_code().as_u16(), 401);

        let output = logs.contents();
        assert!(output.contains("Request completed"));
        assert!(output.contains("status=401"));
        assert!(output.contains("failed=true"));
    }

    #[actix_web::test]
    async fn test_successful_requests_are_logged() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let app = test::init_service(
            App::new()
                .wrap(RequestLogger)
                .route("/ok", web::get().to(|| async { HttpResponse::Ok().finish() })),
        )
        .await;

        let req = test::TestRequest::get().uri("/ok").to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let output = logs.contents();
        assert!(output.contains("Request completed"));
        assert!(output.contains("status=200"));
        assert!(output.contains("failed=false"));
    }
}

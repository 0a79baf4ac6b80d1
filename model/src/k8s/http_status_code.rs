pub use http::StatusCode;
use kube::Error;

pub trait HttpStatusCode {
    fn status_code(&self) -> Option<StatusCode>;

    fn is_status_code(&self, status_code: StatusCode) -> bool {
        self.status_code()
            .map(|some| some == status_code)
            .unwrap_or_default()
    }
}

impl HttpStatusCode for kube::Error {
    fn status_code(&self) -> Option<StatusCode> {
        if let Error::Api(error_response) = self {
            StatusCode::from_u16(error_response.code).ok()
        } else {
            None
        }
    }
}

/// Turns a 404 from the API server into `Ok(None)`.
pub(crate) trait AllowNotFound<T> {
    fn allow_not_found(self) -> Result<Option<T>, Error>;
}

impl<T> AllowNotFound<T> for Result<T, Error> {
    fn allow_not_found(self) -> Result<Option<T>, Error> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_status_code(StatusCode::NOT_FOUND) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[test]
fn not_found_is_none() {
    use kube::core::ErrorResponse;
    let not_found: Result<(), Error> = Err(Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "namespaces \"kubeflow\" not found".to_string(),
        reason: "NotFound".to_string(),
        code: 404,
    }));
    assert!(not_found.allow_not_found().unwrap().is_none());

    let forbidden: Result<(), Error> = Err(Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: "forbidden".to_string(),
        reason: "Forbidden".to_string(),
        code: 403,
    }));
    assert!(forbidden.allow_not_found().is_err());
}

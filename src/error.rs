use actix_web::error::{BlockingError, ResponseError};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use diesel::r2d2;
use diesel::result::Error as DieselError;
use std::convert::From;

pub type Result<T> = ::std::result::Result<T, Error>;

#[derive(Debug, Display)]
pub enum Error {
    /// A required form field was missing; reported back to the user.
    #[display(fmt = "{}", _0)]
    Validation(&'static str),

    #[display(fmt = "Wine {} not found", _0)]
    WineNotFound(i32),

    #[display(fmt = "Consumption {} not found", _0)]
    ConsumptionNotFound(i32),

    #[display(fmt = "Invalid configuration: {}", _0)]
    Config(String),

    #[display(fmt = "Database error: {}", _0)]
    DieselError(DieselError),

    #[display(fmt = "Connection pool error: {}", _0)]
    PoolError(r2d2::PoolError),

    #[display(fmt = "Template error: {}", _0)]
    TemplateError(tera::Error),

    #[display(fmt = "Blocking operation canceled")]
    Canceled,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::WineNotFound(_) | Self::ConsumptionNotFound(_) => true,
            _ => false,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DieselError(e) => Some(e),
            Self::PoolError(e) => Some(e),
            Self::TemplateError(e) => Some(e),
            Self::Validation(_)
            | Self::WineNotFound(_)
            | Self::ConsumptionNotFound(_)
            | Self::Config(_)
            | Self::Canceled => None,
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            e if e.is_not_found() => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("{}", self);
        }

        HttpResponse::build(status)
            .content_type("text/plain; charset=utf-8")
            .body(status.canonical_reason().unwrap_or("Error"))
    }
}

impl From<DieselError> for Error {
    fn from(e: DieselError) -> Error {
        Error::DieselError(e)
    }
}

impl From<r2d2::PoolError> for Error {
    fn from(e: r2d2::PoolError) -> Error {
        Error::PoolError(e)
    }
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Error {
        Error::TemplateError(e)
    }
}

impl From<BlockingError<Error>> for Error {
    fn from(e: BlockingError<Error>) -> Error {
        match e {
            BlockingError::Error(e) => e,
            BlockingError::Canceled => Error::Canceled,
        }
    }
}

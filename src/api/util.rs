use actix_web::http::{header, Cookie};
use actix_web::{HttpMessage, HttpRequest, HttpResponse};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Name of the cookie carrying a message across a redirect.
pub const FLASH_COOKIE: &str = "flash";

/// Bytes that cannot appear raw in a cookie value. Non-ASCII is always encoded.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b',')
    .add(b';')
    .add(b'\\');

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
    Info,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Error => "error",
            Level::Info => "info",
        }
    }

    fn parse(value: &str) -> Option<Level> {
        match value {
            "success" => Some(Level::Success),
            "error" => Some(Level::Error),
            "info" => Some(Level::Info),
            _ => None,
        }
    }
}

/// A one-shot status message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success<S: Into<String>>(message: S) -> Flash {
        Flash {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Flash {
        Flash {
            level: Level::Error,
            message: message.into(),
        }
    }

    pub fn info<S: Into<String>>(message: S) -> Flash {
        Flash {
            level: Level::Info,
            message: message.into(),
        }
    }

    /// Cookie form: `{level}:{message}`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.level.as_str(), self.message)
    }

    /// `encode`, percent-encoded for a `Set-Cookie` header. Incoming cookies
    /// are decoded by actix before `decode` sees them.
    pub fn cookie_value(&self) -> String {
        utf8_percent_encode(&self.encode(), COOKIE_VALUE).to_string()
    }

    pub fn decode(value: &str) -> Option<Flash> {
        let mut parts = value.splitn(2, ':');
        let level = Level::parse(parts.next()?)?;
        let message = parts.next()?;

        if message.is_empty() {
            return None;
        }

        Some(Flash {
            level,
            message: message.to_owned(),
        })
    }

    /// The pending message sent with `req`, if any.
    pub fn from_request(req: &HttpRequest) -> Option<Flash> {
        req.cookie(FLASH_COOKIE)
            .and_then(|cookie| Flash::decode(cookie.value()))
    }
}

fn flash_cookie(value: String) -> Cookie<'static> {
    Cookie::build(FLASH_COOKIE, value)
        .path("/")
        .http_only(true)
        .finish()
}

/// `302 Found` to `location`, carrying `flash` for the next page.
pub fn redirect(location: &str, flash: Flash) -> HttpResponse {
    HttpResponse::Found()
        .header(header::LOCATION, location)
        .cookie(flash_cookie(flash.cookie_value()))
        .finish()
}

/// An HTML page. Once a flash has been shown its cookie is cleared.
pub fn page(body: String, clear_flash: bool) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response.content_type("text/html; charset=utf-8");

    if clear_flash {
        response.del_cookie(&flash_cookie(String::new()));
    }

    response.body(body)
}

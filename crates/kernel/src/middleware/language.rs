//! Language negotiation middleware.
//!
//! Resolves the active language for each request using a chain of negotiators.
//! Resolution order: session override → URL prefix → Accept-Language → default.
//!
//! Vietnamese pages live under `/vi` as a nested router, so the prefix is
//! only read here, never stripped.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::content::Language;
use crate::state::AppState;

/// Session key for storing the user's active language override.
pub const SESSION_ACTIVE_LANGUAGE: &str = "active_language";

/// The resolved language for the current request.
///
/// Stored in request extensions for per-request access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedLanguage(pub Language);

/// Trait for language negotiation strategies.
///
/// Implementations inspect the request and return a language if they can
/// determine the desired one. The middleware chains negotiators by priority
/// (highest first) and uses the first match.
pub trait LanguageNegotiator: Send + Sync {
    /// Attempt to negotiate a language from the request.
    fn negotiate(&self, request: &Request<Body>) -> Option<Language>;

    /// Priority of this negotiator (higher = checked first).
    fn priority(&self) -> i32;
}

/// Negotiates language from the URL prefix (`/vi/team` → Vietnamese).
///
/// Only matches exact language codes followed by `/` or end-of-path, so
/// `/video` is not Vietnamese. The default language has no prefix.
pub struct UrlPrefixNegotiator {
    default_language: Language,
}

impl UrlPrefixNegotiator {
    pub fn new(default_language: Language) -> Self {
        Self { default_language }
    }

    /// Extract the language and remaining path from a URL prefix.
    pub fn extract_prefix<'a>(&self, path: &'a str) -> Option<(Language, &'a str)> {
        let trimmed = path.strip_prefix('/')?;

        let (candidate, rest) = match trimmed.find('/') {
            Some(pos) => (&trimmed[..pos], &trimmed[pos..]),
            None => (trimmed, ""),
        };

        let lang = Language::ALL
            .into_iter()
            .find(|l| l.code() == candidate && *l != self.default_language)?;

        Some((lang, if rest.is_empty() { "/" } else { rest }))
    }
}

impl LanguageNegotiator for UrlPrefixNegotiator {
    fn negotiate(&self, request: &Request<Body>) -> Option<Language> {
        self.extract_prefix(request.uri().path())
            .map(|(lang, _)| lang)
    }

    fn priority(&self) -> i32 {
        100
    }
}

/// Negotiates language from the Accept-Language HTTP header.
///
/// Parses quality values and returns the highest-quality supported language.
#[derive(Default)]
pub struct AcceptLanguageNegotiator;

impl AcceptLanguageNegotiator {
    pub fn new() -> Self {
        Self
    }

    /// Parse an Accept-Language header into (tag, quality) pairs, sorted by
    /// quality descending (stable sort keeps header order for ties).
    fn parse_accept_language(header: &str) -> Vec<(String, f32)> {
        let mut langs: Vec<(String, f32)> = header
            .split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }

                let mut segments = part.split(';');
                let lang = segments.next()?.trim().to_lowercase();

                let quality = segments
                    .find_map(|s| {
                        s.trim()
                            .strip_prefix("q=")
                            .and_then(|q| q.trim().parse::<f32>().ok())
                    })
                    .unwrap_or(1.0)
                    .clamp(0.0, 1.0);

                Some((lang, quality))
            })
            .collect();

        langs.sort_by(|a, b| b.1.total_cmp(&a.1));
        langs
    }
}

impl LanguageNegotiator for AcceptLanguageNegotiator {
    fn negotiate(&self, request: &Request<Body>) -> Option<Language> {
        let header = request
            .headers()
            .get(header::ACCEPT_LANGUAGE)?
            .to_str()
            .ok()?;

        Self::parse_accept_language(header)
            .into_iter()
            .filter(|(_, quality)| *quality > 0.0)
            .find_map(|(tag, _)| Language::parse(&tag))
    }

    fn priority(&self) -> i32 {
        50
    }
}

/// Middleware to negotiate the active language for each request.
///
/// Static files, uploads, the JSON API, and the health check skip
/// negotiation and get the default language.
pub async fn negotiate_language(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let default_language = state.default_language();

    if path.starts_with("/static/")
        || path.starts_with("/files/")
        || path.starts_with("/api/")
        || path == "/health"
    {
        request
            .extensions_mut()
            .insert(ResolvedLanguage(default_language));
        return next.run(request).await;
    }

    let session_lang: Option<String> = session
        .get::<String>(SESSION_ACTIVE_LANGUAGE)
        .await
        .ok()
        .flatten();

    let language = select_language(
        session_lang.as_deref(),
        state.language_negotiators(),
        &request,
        default_language,
    );

    request.extensions_mut().insert(ResolvedLanguage(language));

    next.run(request).await
}

/// Select the active language from available sources.
fn select_language(
    session_lang: Option<&str>,
    negotiators: &[std::sync::Arc<dyn LanguageNegotiator>],
    request: &Request<Body>,
    default_language: Language,
) -> Language {
    if let Some(code) = session_lang {
        match Language::parse(code) {
            Some(lang) => return lang,
            None => tracing::warn!(
                session_language = %code,
                "session contains unknown language, ignoring"
            ),
        }
    }

    negotiators
        .iter()
        .find_map(|n| n.negotiate(request))
        .unwrap_or(default_language)
}

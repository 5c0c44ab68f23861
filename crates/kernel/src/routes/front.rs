//! Public pages.
//!
//! Every page loads its documents, attaches referenced documents, and
//! renders a template with the shared site context (languages, menu tree,
//! current user). The same router is nested under the prefix of the
//! non-default language.

use axum::{
    Extension, Router,
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::content::{Document, Language, ListQuery, Stored, StoreError};
use crate::middleware::language::UrlPrefixNegotiator;
use crate::middleware::{ResolvedLanguage, SESSION_ACTIVE_LANGUAGE};
use crate::models::{
    Banner, CaseStudy, Category, Member, MenuLink, Post, Product, Service, Testimonial,
};
use crate::routes::helpers::{
    current_user, is_local_path, lang_prefix, render_server_error, render_with_status,
};
use crate::state::AppState;

/// Posts per blog page.
const POSTS_PER_PAGE: u32 = 10;

/// Case studies and products per listing page.
const ITEMS_PER_PAGE: u32 = 12;

/// Upper bound on menu links loaded for navigation.
const MENU_LIMIT: u32 = 100;

/// Public page routes, without a language prefix.
pub fn pages() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/services", get(services))
        .route("/services/{slug}", get(service))
        .route("/team", get(team))
        .route("/team/{slug}", get(member))
        .route("/case-studies", get(case_studies))
        .route("/case-studies/{slug}", get(case_study))
        .route("/blog", get(blog))
        .route("/blog/{slug}", get(post))
        .route("/products", get(products))
        .route("/products/{slug}", get(product))
}

/// Public pages at the root and under every non-default language prefix,
/// plus the language switch.
pub fn router(default_language: Language) -> Router<AppState> {
    let mut router = pages().route("/lang/{code}", get(switch_language));
    for lang in Language::ALL {
        if lang != default_language {
            router = router.nest(&format!("/{}", lang.code()), pages());
        }
    }
    router
}

/// A document with the document it refers to, if that still exists.
#[derive(Debug, Serialize)]
struct Linked<D, R> {
    item: Stored<D>,
    related: Option<Stored<R>>,
}

/// Attach referenced documents to a list of documents.
async fn link_all<D: Document, R: Document>(
    state: &AppState,
    items: Vec<Stored<D>>,
    reference: impl Fn(&D) -> Option<uuid::Uuid>,
) -> Result<Vec<Linked<D, R>>, StoreError> {
    let ids: Vec<_> = items.iter().filter_map(|s| reference(&s.doc)).collect();
    let mut related = state.store().get_many::<R>(&ids).await?;

    Ok(items
        .into_iter()
        .map(|item| {
            let related = reference(&item.doc).and_then(|id| related.remove(&id));
            Linked { item, related }
        })
        .collect())
}

/// Language toggle entry.
#[derive(Debug, Serialize)]
struct LanguageLink {
    code: &'static str,
    name: &'static str,
    active: bool,
    url: String,
}

/// Toggle entries that switch to each language and come back to `here`.
fn language_links(active: Language, here: &str) -> Vec<LanguageLink> {
    let redirect = urlencoding::encode(here);
    Language::ALL
        .iter()
        .map(|&l| LanguageLink {
            code: l.code(),
            name: l.native_name(),
            active: l == active,
            url: format!("/lang/{}?redirect={redirect}", l.code()),
        })
        .collect()
}

/// Strip a non-default language prefix from a path.
fn unprefixed(path: &str, default: Language) -> &str {
    match UrlPrefixNegotiator::new(default).extract_prefix(path) {
        Some((_, rest)) => rest,
        None => path,
    }
}

/// `path` as seen in `lang`.
fn localized_path(path: &str, lang: Language, default: Language) -> String {
    let prefix = lang_prefix(lang, default);
    match (prefix.is_empty(), path) {
        (true, _) => path.to_string(),
        (false, "/") => prefix,
        (false, _) => format!("{prefix}{path}"),
    }
}

/// Context shared by every public page.
async fn site_context(
    state: &AppState,
    session: &Session,
    lang: Language,
    uri: &axum::http::Uri,
) -> Result<tera::Context, StoreError> {
    let default = state.default_language();
    let path = unprefixed(uri.path(), default);
    let here = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let languages = language_links(lang, &here);

    let links = state.store().published::<MenuLink>(MENU_LIMIT).await?;
    let menu = MenuLink::build_tree(&links, lang);

    let mut context = tera::Context::new();
    context.insert("site_name", state.site_name());
    context.insert("lang", lang.code());
    context.insert("prefix", &lang_prefix(lang, default));
    context.insert("path", path);
    context.insert("languages", &languages);
    context.insert("menu", &menu);
    context.insert("user", &current_user(state, session).await);
    Ok(context)
}

/// Render a public page, or the 500 page if loading failed.
async fn page(
    state: &AppState,
    session: &Session,
    lang: Language,
    uri: &axum::http::Uri,
    template: &str,
    fill: impl FnOnce(&mut tera::Context),
) -> Response {
    let mut context = match site_context(state, session, lang, uri).await {
        Ok(context) => context,
        Err(e) => {
            tracing::error!(error = %e, "failed to load site context");
            return render_server_error("The page could not be loaded.");
        }
    };
    fill(&mut context);
    render_with_status(state, StatusCode::OK, template, &context)
}

/// The 404 page, rendered inside the site layout.
pub async fn not_found(
    State(state): State<AppState>,
    session: Session,
    lang: Option<Extension<ResolvedLanguage>>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let lang = lang.map_or(state.default_language(), |Extension(ResolvedLanguage(l))| l);
    not_found_page(&state, &session, lang, &uri).await
}

async fn not_found_page(
    state: &AppState,
    session: &Session,
    lang: Language,
    uri: &axum::http::Uri,
) -> Response {
    match site_context(state, session, lang, uri).await {
        Ok(context) => render_with_status(state, StatusCode::NOT_FOUND, "404.html", &context),
        Err(e) => {
            tracing::error!(error = %e, "failed to load site context");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

fn load_failed(e: StoreError, what: &str) -> Response {
    tracing::error!(error = %e, what, "failed to load page content");
    render_server_error("The page could not be loaded.")
}

/// Fetch a published document by slug; `None` when missing or hidden.
async fn published_by_slug<D: Document>(
    state: &AppState,
    slug: &str,
) -> Result<Option<Stored<D>>, StoreError> {
    Ok(state
        .store()
        .find_by_slug::<D>(slug)
        .await?
        .filter(|s| s.doc.published()))
}

#[derive(Debug, Default, Deserialize)]
struct PageParam {
    page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct BlogParams {
    page: Option<u32>,
    category: Option<String>,
}

/// GET /
async fn home(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let store = state.store();
    let loaded = tokio::try_join!(
        store.published::<Banner>(10),
        store.published::<Service>(12),
        store.published::<Member>(8),
        store.published::<Testimonial>(10),
        store.published::<CaseStudy>(3),
        store.published::<Post>(3),
    );
    let (banners, services, members, testimonials, case_studies, posts) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => return load_failed(e, "home"),
    };

    page(&state, &session, lang, &uri, "home.html", |context| {
        context.insert("banners", &banners);
        context.insert("services", &services);
        context.insert("members", &members);
        context.insert("testimonials", &testimonials);
        context.insert("case_studies", &case_studies);
        context.insert("posts", &posts);
    })
    .await
}

/// GET /services
async fn services(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let services = match state
        .store()
        .published::<Service>(crate::content::store::MAX_PER_PAGE)
        .await
    {
        Ok(services) => services,
        Err(e) => return load_failed(e, "services"),
    };

    page(&state, &session, lang, &uri, "services.html", |context| {
        context.insert("services", &services);
    })
    .await
}

/// GET /services/{slug}
async fn service(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Response {
    let service = match published_by_slug::<Service>(&state, &slug).await {
        Ok(Some(service)) => service,
        Ok(None) => return not_found_page(&state, &session, lang, &uri).await,
        Err(e) => return load_failed(e, "service"),
    };

    let query = ListQuery::new()
        .published_only()
        .where_field("service", service.id.to_string())
        .page(1, 6);
    let case_studies = match state.store().list::<CaseStudy>(&query).await {
        Ok(page) => page.items,
        Err(e) => return load_failed(e, "service case studies"),
    };

    page(&state, &session, lang, &uri, "service.html", |context| {
        context.insert("service", &service);
        context.insert("case_studies", &case_studies);
    })
    .await
}

/// GET /team
async fn team(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
) -> Response {
    let members = match state
        .store()
        .published::<Member>(crate::content::store::MAX_PER_PAGE)
        .await
    {
        Ok(members) => members,
        Err(e) => return load_failed(e, "team"),
    };

    page(&state, &session, lang, &uri, "team.html", |context| {
        context.insert("members", &members);
    })
    .await
}

/// GET /team/{slug}
async fn member(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Response {
    let member = match published_by_slug::<Member>(&state, &slug).await {
        Ok(Some(member)) => member,
        Ok(None) => return not_found_page(&state, &session, lang, &uri).await,
        Err(e) => return load_failed(e, "member"),
    };

    page(&state, &session, lang, &uri, "member.html", |context| {
        context.insert("member", &member);
    })
    .await
}

/// GET /case-studies
async fn case_studies(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParam>,
) -> Response {
    let query = ListQuery::new()
        .published_only()
        .page(params.page.unwrap_or(1), ITEMS_PER_PAGE);
    let listing = match state.store().list::<CaseStudy>(&query).await {
        Ok(listing) => listing,
        Err(e) => return load_failed(e, "case studies"),
    };
    let total_pages = listing.total_pages();
    let current = listing.page;
    let items = match link_all::<_, Service>(&state, listing.items, |c| c.service).await {
        Ok(items) => items,
        Err(e) => return load_failed(e, "case study services"),
    };

    page(&state, &session, lang, &uri, "case_studies.html", |context| {
        context.insert("case_studies", &items);
        context.insert("page", &current);
        context.insert("total_pages", &total_pages);
    })
    .await
}

/// GET /case-studies/{slug}
async fn case_study(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Response {
    let case_study = match published_by_slug::<CaseStudy>(&state, &slug).await {
        Ok(Some(case_study)) => case_study,
        Ok(None) => return not_found_page(&state, &session, lang, &uri).await,
        Err(e) => return load_failed(e, "case study"),
    };
    let linked = match link_all::<_, Service>(&state, vec![case_study], |c| c.service).await {
        Ok(mut linked) => linked.pop(),
        Err(e) => return load_failed(e, "case study service"),
    };

    page(&state, &session, lang, &uri, "case_study.html", |context| {
        context.insert("entry", &linked);
    })
    .await
}

/// GET /blog
async fn blog(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<BlogParams>,
) -> Response {
    let mut query = ListQuery::new()
        .published_only()
        .page(params.page.unwrap_or(1), POSTS_PER_PAGE);

    let category = match params.category.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => match state.store().find_by_slug::<Category>(slug).await {
            Ok(Some(category)) => Some(category),
            Ok(None) => return not_found_page(&state, &session, lang, &uri).await,
            Err(e) => return load_failed(e, "blog category"),
        },
        None => None,
    };
    if let Some(category) = &category {
        query = query.where_field("category", category.id.to_string());
    }

    let store = state.store();
    let (listing, categories) = match tokio::try_join!(
        store.list::<Post>(&query),
        store.published::<Category>(crate::content::store::MAX_PER_PAGE),
    ) {
        Ok(loaded) => loaded,
        Err(e) => return load_failed(e, "blog"),
    };
    let total_pages = listing.total_pages();
    let current = listing.page;
    let posts = match link_all::<_, Category>(&state, listing.items, |p| p.category).await {
        Ok(posts) => posts,
        Err(e) => return load_failed(e, "post categories"),
    };

    page(&state, &session, lang, &uri, "blog.html", |context| {
        context.insert("posts", &posts);
        context.insert("categories", &categories);
        context.insert("category", &category);
        context.insert("page", &current);
        context.insert("total_pages", &total_pages);
    })
    .await
}

/// GET /blog/{slug}
async fn post(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Response {
    let post = match published_by_slug::<Post>(&state, &slug).await {
        Ok(Some(post)) => post,
        Ok(None) => return not_found_page(&state, &session, lang, &uri).await,
        Err(e) => return load_failed(e, "post"),
    };
    let own_id = post.id;
    let linked = match link_all::<_, Category>(&state, vec![post], |p| p.category).await {
        Ok(mut linked) => linked.pop(),
        Err(e) => return load_failed(e, "post category"),
    };
    let recent: Vec<_> = match state.store().published::<Post>(4).await {
        Ok(recent) => recent.into_iter().filter(|p| p.id != own_id).take(3).collect(),
        Err(e) => return load_failed(e, "recent posts"),
    };

    page(&state, &session, lang, &uri, "post.html", |context| {
        context.insert("entry", &linked);
        context.insert("recent", &recent);
    })
    .await
}

/// GET /products
async fn products(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParam>,
) -> Response {
    let query = ListQuery::new()
        .published_only()
        .page(params.page.unwrap_or(1), ITEMS_PER_PAGE);
    let listing = match state.store().list::<Product>(&query).await {
        Ok(listing) => listing,
        Err(e) => return load_failed(e, "products"),
    };
    let total_pages = listing.total_pages();
    let current = listing.page;
    let items = match link_all::<_, Category>(&state, listing.items, |p| p.category).await {
        Ok(items) => items,
        Err(e) => return load_failed(e, "product categories"),
    };

    page(&state, &session, lang, &uri, "products.html", |context| {
        context.insert("products", &items);
        context.insert("page", &current);
        context.insert("total_pages", &total_pages);
    })
    .await
}

/// GET /products/{slug}
async fn product(
    State(state): State<AppState>,
    session: Session,
    Extension(ResolvedLanguage(lang)): Extension<ResolvedLanguage>,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Response {
    let product = match published_by_slug::<Product>(&state, &slug).await {
        Ok(Some(product)) => product,
        Ok(None) => return not_found_page(&state, &session, lang, &uri).await,
        Err(e) => return load_failed(e, "product"),
    };
    let linked = match link_all::<_, Category>(&state, vec![product], |p| p.category).await {
        Ok(mut linked) => linked.pop(),
        Err(e) => return load_failed(e, "product category"),
    };

    page(&state, &session, lang, &uri, "product.html", |context| {
        context.insert("entry", &linked);
    })
    .await
}

#[derive(Debug, Default, Deserialize)]
struct RedirectParam {
    redirect: Option<String>,
}

/// GET /lang/{code}?redirect=/path
///
/// Stores the language override and sends the visitor back to the same
/// page in the chosen language.
async fn switch_language(
    State(state): State<AppState>,
    session: Session,
    Path(code): Path<String>,
    Query(params): Query<RedirectParam>,
) -> Response {
    let Some(lang) = Language::parse(&code) else {
        return (StatusCode::NOT_FOUND, "Unknown language").into_response();
    };

    if let Err(e) = session
        .insert(SESSION_ACTIVE_LANGUAGE, lang.code().to_string())
        .await
    {
        tracing::error!(error = %e, "failed to store language override");
        return render_server_error("The language could not be changed.");
    }

    let default = state.default_language();
    let target = params
        .redirect
        .filter(|r| is_local_path(r))
        .unwrap_or_else(|| "/".to_string());
    let target = localized_path(unprefixed(&target, default), lang, default);

    tracing::debug!(language = %lang, %target, "language switched");
    Redirect::to(&target).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_follow_default_language() {
        assert_eq!(unprefixed("/vi/team/lan", Language::En), "/team/lan");
        assert_eq!(unprefixed("/vi", Language::En), "/");
        assert_eq!(unprefixed("/video", Language::En), "/video");
        assert_eq!(unprefixed("/vi/team", Language::Vi), "/vi/team");
    }

    #[test]
    fn localized_paths() {
        assert_eq!(localized_path("/", Language::Vi, Language::En), "/vi");
        assert_eq!(localized_path("/blog", Language::Vi, Language::En), "/vi/blog");
        assert_eq!(localized_path("/blog", Language::En, Language::En), "/blog");
        assert_eq!(localized_path("/", Language::En, Language::Vi), "/en");
    }

    #[test]
    fn redirect_targets_are_encoded() {
        let links = language_links(Language::Vi, "/blog?category=tax law");
        assert_eq!(links.len(), 2);
        assert_eq!(
            links[0].url,
            "/lang/en?redirect=%2Fblog%3Fcategory%3Dtax%20law"
        );
        assert!(links[1].active);
        assert!(!links[0].active);
    }
}

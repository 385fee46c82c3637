//! HTTP routes.
//!
//! Every success is `200 { "message": ... }`; every failure goes through
//! `ProxyError` and becomes `404 { "error": ... }`.
//!
//! Registration order matters: the catch-all `/{id}` must come last.

use actix_web::{get, web, HttpResponse};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::app_state::AppState;
use crate::error::ProxyError;
use crate::metrics::{track_request, KANA, LEGACY};
use crate::models::{Envelope, NormalizedVn, VnPage};
use crate::normalize::normalize_all;
use crate::query::{
    leading_int, parse_int, relations_command, CharacterParams, KanaQuery, ReleaseParams,
    StaffParams, TagParams, VnListParams, KANA_PAGE_SIZE,
};
use crate::random::{draw_distinct, MAX_RANDOM_ROUNDS, RANDOM_BATCH};

fn ok<T: Serialize>(message: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::new(message))
}

/// Fetch and normalize; also hands back the upstream `count` when requested.
async fn fetch_vns(
    data: &AppState,
    query: &KanaQuery,
) -> Result<(Vec<NormalizedVn>, Option<u64>), ProxyError> {
    let response = track_request(&data.metrics, KANA, data.kana.query_vn(query)).await?;
    let vns = normalize_all(response.results, data.placeholder_image())?;
    Ok((vns, response.count))
}

async fn legacy_query(data: &AppState, command: &str) -> Result<Value, ProxyError> {
    track_request(&data.metrics, LEGACY, data.legacy.query(command)).await
}

#[get("/")]
async fn list_vn(
    data: web::Data<AppState>,
    query: web::Query<VnListParams>,
) -> Result<HttpResponse, ProxyError> {
    let params = query.into_inner();
    let (vns, count) = fetch_vns(&data, &params.to_query()?).await?;

    if !params.wants_last_page() {
        return Ok(ok(vns));
    }
    Ok(ok(VnPage {
        data: vns,
        max_page: count.unwrap_or(0).div_ceil(KANA_PAGE_SIZE),
    }))
}

#[get("/tags")]
async fn search_tags(
    data: web::Data<AppState>,
    query: web::Query<TagParams>,
) -> Result<HttpResponse, ProxyError> {
    let params = query.into_inner();
    if params.is_batch() {
        return Ok(ok(data.tags.by_ids(params.list.as_deref())?));
    }
    let page = data.tags.search(params.q.as_deref(), params.page()?)?;
    Ok(ok(page))
}

#[get("/tags/{id}")]
async fn get_tag(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ProxyError> {
    // leading digits only: `/tags/7abc` is tag 7, `/tags/abc` matches nothing
    match leading_int(&id).and_then(|id| data.tags.get(id)) {
        Some(tag) => Ok(ok(tag)),
        // unknown tag: no `message` at all
        None => Ok(HttpResponse::Ok().json(json!({}))),
    }
}

#[get("/random")]
async fn random_vn(data: web::Data<AppState>) -> Result<HttpResponse, ProxyError> {
    let stats = track_request(&data.metrics, KANA, data.kana.stats()).await?;
    let total = stats
        .get("vn")
        .and_then(Value::as_u64)
        .ok_or_else(|| ProxyError::MalformedResponse("stats without a `vn` count".to_string()))?;

    let mut picked: Vec<NormalizedVn> = Vec::with_capacity(RANDOM_BATCH);
    let mut tried: HashSet<u64> = HashSet::new();
    for round in 0..MAX_RANDOM_ROUNDS {
        let missing = RANDOM_BATCH.saturating_sub(picked.len());
        if missing == 0 {
            break;
        }
        let ids = draw_distinct(&mut rand::thread_rng(), missing, total, &tried);
        if ids.is_empty() {
            break;
        }
        log::debug!("random round {}: {:?}", round + 1, ids);
        tried.extend(ids.iter().copied());

        let (vns, _) = fetch_vns(&data, &KanaQuery::any_id(&ids)).await?;
        picked.extend(vns);
    }

    Ok(ok(picked))
}

#[get("/release")]
async fn get_release(
    data: web::Data<AppState>,
    query: web::Query<ReleaseParams>,
) -> Result<HttpResponse, ProxyError> {
    Ok(ok(legacy_query(&data, &query.command()).await?))
}

#[get("/character")]
async fn get_character(
    data: web::Data<AppState>,
    query: web::Query<CharacterParams>,
) -> Result<HttpResponse, ProxyError> {
    Ok(ok(legacy_query(&data, &query.command()).await?))
}

#[get("/staff")]
async fn get_staff(
    data: web::Data<AppState>,
    query: web::Query<StaffParams>,
) -> Result<HttpResponse, ProxyError> {
    Ok(ok(legacy_query(&data, &query.command()).await?))
}

#[get("/stats")]
async fn get_stats(data: web::Data<AppState>) -> Result<HttpResponse, ProxyError> {
    let stats = track_request(&data.metrics, KANA, data.kana.stats()).await?;
    Ok(ok(stats))
}

#[get("/metrics")]
async fn get_metrics(data: web::Data<AppState>) -> HttpResponse {
    ok(data.metrics.get_all_metrics())
}

#[get("/{vn_id}/relations")]
async fn get_relations(
    data: web::Data<AppState>,
    vn_id: web::Path<String>,
) -> Result<HttpResponse, ProxyError> {
    let id: u64 = parse_int("vnId", &vn_id)?;
    let body = legacy_query(&data, &relations_command(id)).await?;
    let relations = body
        .pointer("/items/0/relations")
        .cloned()
        .ok_or_else(|| ProxyError::NotFound(format!("relations of v{}", id)))?;
    Ok(ok(relations))
}

#[get("/{id}")]
async fn get_vn(
    data: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ProxyError> {
    let id: u64 = parse_int("id", &id)?;
    let (vns, _) = fetch_vns(&data, &KanaQuery::by_id(id)).await?;
    let vn = vns
        .into_iter()
        .next()
        .ok_or_else(|| ProxyError::NotFound(format!("v{}", id)))?;
    Ok(ok(vn))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_vn)
        .service(search_tags)
        .service(get_tag)
        .service(random_vn)
        .service(get_release)
        .service(get_character)
        .service(get_staff)
        .service(get_stats)
        .service(get_metrics)
        .service(get_relations)
        .service(get_vn);
}

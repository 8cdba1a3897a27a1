//! Request handlers for every LDP verb.
//!
//! Each handler resolves the target URI, calls into [`ResourceManager`] and
//! decorates the response with the capability headers of the target.

use super::response::set_header;
use super::middleware::LdpState;
use super::ServerState;
use crate::core::codec::{self, RdfFormat};
use crate::core::error::Result;
use crate::core::protocol::headers::{self as ldp_headers, format_type_links};
use crate::core::protocol::{Capabilities, Verb};
use crate::core::resource::{ChildName, Payload, PutOutcome};
use crate::core::types::vocab::ldp;
use crate::core::types::{ResourceKind, ResourceSnapshot, ResourceState};
use axum::extract::{Extension, State};
use axum::http::{header, HeaderName, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use oxrdf::NamedNode;
use std::sync::Arc;

fn target(state: &ServerState, ldp_state: &LdpState, uri: &Uri) -> Result<NamedNode> {
    let base = state.config.base_for(ldp_state.host.as_deref())?;
    state.config.target_uri(&base, uri.path())
}

fn payload(state: &ServerState, ldp_state: &LdpState, body: Bytes) -> Result<Payload> {
    let format = state
        .engine
        .negotiator()
        .select_input(ldp_state.content_type.as_deref())?;
    Ok(Payload::new(body, format).with_interaction_model(ldp_state.interaction_model))
}

fn type_links(kind: ResourceKind) -> String {
    let mut types = vec![ldp::RESOURCE.into_owned()];
    types.extend(kind.type_iris());
    format_type_links(&types)
}

/// Allow / Accept-Post / Accept-Patch for `caps`.
fn describe_capabilities(response: &mut Response, caps: &Capabilities) {
    set_header(response, header::ALLOW, &caps.allow_header());
    if let Some(accept_post) = caps.accept_post_header() {
        set_header(
            response,
            HeaderName::from_static(ldp_headers::ACCEPT_POST),
            &accept_post,
        );
    }
    if let Some(accept_patch) = caps.accept_patch_header() {
        set_header(
            response,
            HeaderName::from_static(ldp_headers::ACCEPT_PATCH),
            &accept_patch,
        );
    }
}

/// ETag, type links and capabilities of a live resource.
fn describe(state: &ServerState, response: &mut Response, snapshot: &ResourceSnapshot) {
    if let Some(etag) = snapshot.etag() {
        set_header(response, header::ETAG, &etag.to_string());
    }
    if let ResourceState::Live(kind) = snapshot.state {
        set_header(response, header::LINK, &type_links(kind));
    }
    let caps = Capabilities::compose(
        snapshot.state,
        &state.engine.negotiator().input_media_types(),
    );
    describe_capabilities(response, &caps);
}

fn represent(
    state: &ServerState,
    snapshot: &ResourceSnapshot,
    format: RdfFormat,
    status: StatusCode,
    with_body: bool,
) -> Result<Response> {
    let body = codec::serialize(&snapshot.statements, format)?;
    let mut response = if with_body {
        (status, body).into_response()
    } else {
        let mut response = status.into_response();
        set_header(&mut response, header::CONTENT_LENGTH, &body.len().to_string());
        response
    };
    set_header(&mut response, header::CONTENT_TYPE, &format.content_type());
    set_header(&mut response, header::VARY, "Accept");
    describe(state, &mut response, snapshot);
    Ok(response)
}

async fn read(state: &ServerState, ldp_state: &LdpState, uri: &Uri, with_body: bool) -> Result<Response> {
    let target = target(state, ldp_state, uri)?;
    let snapshot = state.engine.read(&target, &ldp_state.conditions).await?;
    let format = state
        .engine
        .negotiator()
        .negotiate(ldp_state.accept.as_deref())?;
    represent(state, &snapshot, format, StatusCode::OK, with_body)
}

pub async fn get_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
) -> Result<Response> {
    tracing::info!("GET {}", uri.path());
    read(&state, &ldp_state, &uri, true).await
}

pub async fn head_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
) -> Result<Response> {
    tracing::info!("HEAD {}", uri.path());
    read(&state, &ldp_state, &uri, false).await
}

pub async fn post_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
    body: Bytes,
) -> Result<Response> {
    tracing::info!("POST {} (slug: {:?})", uri.path(), ldp_state.slug);
    let parent = target(&state, &ldp_state, &uri)?;
    state.engine.ensure_accepts(&parent, Verb::Post).await?;
    let payload = payload(&state, &ldp_state, body)?;
    let created = state
        .engine
        .create_child(&parent, ChildName::Suggest(ldp_state.slug.clone()), payload)
        .await?;

    let mut response = StatusCode::CREATED.into_response();
    set_header(&mut response, header::LOCATION, created.uri.as_str());
    describe(&state, &mut response, &created);
    Ok(response)
}

pub async fn put_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
    body: Bytes,
) -> Result<Response> {
    tracing::info!("PUT {}", uri.path());
    let target = target(&state, &ldp_state, &uri)?;
    state.engine.ensure_accepts(&target, Verb::Put).await?;
    let payload = payload(&state, &ldp_state, body)?;
    let outcome = state
        .engine
        .create_or_replace(&target, payload, &ldp_state.conditions)
        .await?;

    match outcome {
        PutOutcome::Created(snapshot) => {
            let mut response = StatusCode::CREATED.into_response();
            set_header(&mut response, header::LOCATION, snapshot.uri.as_str());
            describe(&state, &mut response, &snapshot);
            Ok(response)
        }
        PutOutcome::Replaced(snapshot) => {
            let format = state
                .engine
                .negotiator()
                .negotiate(ldp_state.accept.as_deref())?;
            represent(&state, &snapshot, format, StatusCode::OK, true)
        }
    }
}

pub async fn patch_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
) -> Result<Response> {
    tracing::info!("PATCH {}", uri.path());
    let target = target(&state, &ldp_state, &uri)?;
    let snapshot = state.engine.patch(&target, &ldp_state.conditions).await?;
    let mut response = StatusCode::NO_CONTENT.into_response();
    describe(&state, &mut response, &snapshot);
    Ok(response)
}

pub async fn delete_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
) -> Result<Response> {
    tracing::info!("DELETE {}", uri.path());
    let target = target(&state, &ldp_state, &uri)?;
    state.engine.delete(&target, &ldp_state.conditions).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn options_resource(
    State(state): State<ServerState>,
    Extension(ldp_state): Extension<Arc<LdpState>>,
    uri: Uri,
) -> Result<Response> {
    tracing::debug!("OPTIONS {}", uri.path());
    let target = target(&state, &ldp_state, &uri)?;
    let (resource_state, caps) = state.engine.capabilities(&target).await?;
    let mut response = StatusCode::NO_CONTENT.into_response();
    if let ResourceState::Live(kind) = resource_state {
        set_header(&mut response, header::LINK, &type_links(kind));
    }
    describe_capabilities(&mut response, &caps);
    Ok(response)
}

//! Source fetcher: the registry snapshot the run is planned from.

use anyhow::{Context, Result};
use log::info;
use reqwest::blocking::Client;
use std::path::Path;

use crate::{Entity, EntitySource};

/// GET the registry endpoint and decode the JSON array of entities.
pub fn fetch_entities(client: &Client, url: &str) -> Result<Vec<Entity>> {
    let response = client
        .get(url)
        .send()
        .with_context(|| format!("fetch registry {url}"))?
        .error_for_status()
        .with_context(|| format!("registry {url} returned an error status"))?;
    let body = response
        .text()
        .with_context(|| format!("read registry body from {url}"))?;
    parse_entities(&body).with_context(|| format!("decode registry response from {url}"))
}

/// Load entities from a local JSON file with the same shape as the registry response.
pub fn read_entities(path: &Path) -> Result<Vec<Entity>> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("read entity file {}", path.display()))?;
    parse_entities(&body).with_context(|| format!("decode entity file {}", path.display()))
}

pub fn parse_entities(body: &str) -> Result<Vec<Entity>> {
    Ok(serde_json::from_str(body)?)
}

/// Load the snapshot from wherever `source` points.
pub fn load_entities(client: &Client, source: &EntitySource) -> Result<Vec<Entity>> {
    let entities = match source {
        EntitySource::Url(url) => fetch_entities(client, url)?,
        EntitySource::File(path) => read_entities(path)?,
    };
    info!("Loaded {} entities", entities.len());
    Ok(entities)
}

use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use crate::engine::mesh::{Mesh, MeshError};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("no browser window")]
    NoWindow,
    #[error("request for {url} failed: {message}")]
    Js { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Http { url: String, status: u16 },
    #[error("{url} is not a valid model: {source}")]
    Model {
        url: String,
        #[source]
        source: MeshError,
    },
}

impl From<AssetError> for JsValue {
    fn from(err: AssetError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

fn js_error(url: &str, value: JsValue) -> AssetError {
    AssetError::Js {
        url: url.to_string(),
        message: value.as_string().unwrap_or_else(|| format!("{:?}", value)),
    }
}

async fn fetch(url: &str) -> Result<Response, AssetError> {
    let window = web_sys::window().ok_or(AssetError::NoWindow)?;

    let opts = RequestInit::new();
    opts.set_method("GET");
    opts.set_mode(RequestMode::Cors);

    let request = Request::new_with_str_and_init(url, &opts).map_err(|e| js_error(url, e))?;
    let resp_value = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(|e| js_error(url, e))?;
    let resp: Response = resp_value.dyn_into().map_err(|e| js_error(url, e))?;

    if !resp.ok() {
        return Err(AssetError::Http {
            url: url.to_string(),
            status: resp.status(),
        });
    }
    Ok(resp)
}

pub async fn fetch_text(url: &str) -> Result<String, AssetError> {
    let resp = fetch(url).await?;
    let text_promise = resp.text().map_err(|e| js_error(url, e))?;
    let text = JsFuture::from(text_promise).await.map_err(|e| js_error(url, e))?;
    text.as_string().ok_or_else(|| AssetError::Js {
        url: url.to_string(),
        message: "response body is not text".to_string(),
    })
}

pub async fn fetch_bytes(url: &str) -> Result<Vec<u8>, AssetError> {
    let resp = fetch(url).await?;
    let buffer_promise = resp.array_buffer().map_err(|e| js_error(url, e))?;
    let buffer = JsFuture::from(buffer_promise).await.map_err(|e| js_error(url, e))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

pub async fn load_model(url: &str) -> Result<Mesh, AssetError> {
    let bytes = fetch_bytes(url).await?;
    Mesh::from_gltf(&bytes).map_err(|source| AssetError::Model {
        url: url.to_string(),
        source,
    })
}

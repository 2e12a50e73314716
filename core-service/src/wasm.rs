//! Browser entry point.
//!
//! [`bootstrap_wasm`] installs the engine into the current page once:
//! it checks the injection flag, builds the engine over the Web Audio
//! adapters and the browser's decoder, overrides `navigator.mediaDevices`, listens for control messages
//! on `window`, and finally sets the flag. JavaScript calls it through
//! `installVirtualMic(config?, fetcher?)`.

use crate::engine::{EngineDependencies, VirtualMicEngine};
use crate::error::{CoreError, Result};
use bridge_traits::fetch::SpeechFetcher;
use bridge_wasm::{
    build_web_bridges, set_panic_hook, to_js_error, JsSpeechFetcher, MessageListener,
    WebAudioBackend, WebAudioDecoder, WebBridgeConfig,
};
use core_devices::GLOBAL_INSTALL_GUARD;
use core_runtime::config::EngineConfig;
use core_runtime::logging::{init_logging_once, LoggingConfig};
use std::sync::Arc;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// The engine over the page's Web Audio stack.
pub type WebEngine = VirtualMicEngine<WebAudioBackend>;

fn init_failed(err: impl std::fmt::Display) -> CoreError {
    CoreError::InitializationFailed(err.to_string())
}

/// Install the engine into the current page.
///
/// Returns `Ok(None)` when the page already carries the injection flag.
pub fn bootstrap_wasm(
    config: EngineConfig,
    speech_fetcher: Option<Arc<dyn SpeechFetcher>>,
) -> Result<Option<Arc<WebEngine>>> {
    let bridges = build_web_bridges(&WebBridgeConfig::new(config.injection_flag.clone()))
        .map_err(init_failed)?;
    if bridges.injection_flag.is_set() {
        info!(
            flag = bridges.injection_flag.name(),
            "Virtual microphone already installed in this page"
        );
        return Ok(None);
    }

    let mut deps = EngineDependencies::new(Arc::clone(&bridges.audio))
        .with_decoder(Arc::new(WebAudioDecoder::new()));
    if let Some(fetcher) = speech_fetcher {
        deps = deps.with_speech_fetcher(fetcher);
    }
    let engine = Arc::new(VirtualMicEngine::new(config, deps)?);

    if let Some(slot) = &bridges.media_devices {
        engine.install_device_shim(&GLOBAL_INSTALL_GUARD, slot)?;
    }

    let listener_engine = Arc::clone(&engine);
    MessageListener::attach(
        bridges.window.clone(),
        engine.config().messaging.direction.clone(),
        move |message| {
            let engine = Arc::clone(&listener_engine);
            spawn_local(async move {
                if let Err(e) = engine.handle(message).await {
                    warn!(error = %e, "Control message failed");
                }
            });
        },
    )
    .map_err(init_failed)?
    .forget();

    bridges.injection_flag.set().map_err(init_failed)?;
    info!("Virtual microphone installed");
    Ok(Some(engine))
}

/// Install the virtual microphone into this page.
///
/// `config` is a partial engine configuration (camelCase keys); `undefined`
/// uses the defaults. Resolves to `false` when the page was already set up.
///
/// ```javascript
/// import init, { installVirtualMic, JsSpeechFetcher } from './virtual_mic.js';
///
/// await init();
/// const fetcher = new JsSpeechFetcher((text) =>
///   chrome.runtime.sendMessage({ type: 'fetchTTS', text }));
/// installVirtualMic({ virtualDevice: { label: 'Narrator' } }, fetcher);
/// ```
#[wasm_bindgen(js_name = installVirtualMic)]
pub fn install_virtual_mic(
    config: JsValue,
    fetcher: Option<JsSpeechFetcher>,
) -> std::result::Result<bool, JsValue> {
    set_panic_hook();
    if let Err(e) = init_logging_once(LoggingConfig::default()) {
        warn!(error = %e, "Logging unavailable");
    }

    let config: EngineConfig = if config.is_undefined() || config.is_null() {
        EngineConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
    };
    let fetcher = fetcher.map(|f| Arc::new(f) as Arc<dyn SpeechFetcher>);

    let installed = bootstrap_wasm(config, fetcher).map_err(to_js_error)?;
    Ok(installed.is_some())
}

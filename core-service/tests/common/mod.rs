#![allow(dead_code)]

use bridge_traits::mock::MockAudioBackend;
use core_service::{EngineConfig, EngineDependencies, EventStream, VirtualMicEngine};
use std::io::Cursor;
use std::sync::Arc;

pub const DIRECTION: &str = "from-extension";

/// Mono 16-bit WAV, 100 ms at 22.05 kHz.
pub fn short_clip() -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 22_050,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..2_205 {
            writer.write_sample(4_000i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub struct TestEngine {
    pub backend: MockAudioBackend,
    pub engine: VirtualMicEngine<MockAudioBackend>,
    pub events: EventStream,
}

impl TestEngine {
    pub fn new() -> Self {
        Self::with_deps(|deps| deps)
    }

    pub fn with_deps(
        f: impl FnOnce(EngineDependencies<MockAudioBackend>) -> EngineDependencies<MockAudioBackend>,
    ) -> Self {
        let backend = MockAudioBackend::new();
        let deps = f(EngineDependencies::new(Arc::new(backend.clone())));
        let engine = VirtualMicEngine::new(EngineConfig::default(), deps).unwrap();
        let events = engine.subscribe();
        Self {
            backend,
            engine,
            events,
        }
    }
}

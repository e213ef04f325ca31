use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::config::DetectorSettings;
use crate::detect::backends::StubBackend;

use super::backend::{DetectionCapability, FaceDetector, SharedDetector};

/// Thread-safe registry of face detector backends.
///
/// Backends are wrapped in `Mutex` because `FaceDetector::detect` takes `&mut self`.
pub struct BackendRegistry {
    backends: HashMap<String, SharedDetector>,
    default_name: Option<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
            default_name: None,
        }
    }

    /// Build the registry described by `settings`, with its backend as default.
    ///
    /// The stub backend is always registered.
    pub fn from_settings(settings: &DetectorSettings) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(StubBackend::new());
        match settings.backend.as_str() {
            "stub" => {}
            #[cfg(feature = "backend-rustface")]
            "rustface" => {
                let model_path = settings
                    .model_path
                    .as_ref()
                    .ok_or_else(|| anyhow!("rustface backend requires a model path"))?;
                let backend = crate::detect::RustfaceBackend::from_model_path(model_path)?
                    .with_min_face_size(settings.min_face_size)
                    .with_score_threshold(settings.score_threshold);
                registry.register(backend);
            }
            #[cfg(not(feature = "backend-rustface"))]
            "rustface" => {
                return Err(anyhow!(
                    "rustface backend requires the backend-rustface feature"
                ));
            }
            other => return Err(anyhow!("unknown detector backend '{}'", other)),
        }
        registry.set_default(&settings.backend)?;
        Ok(registry)
    }

    /// Register a backend. The first registered backend becomes the default.
    pub fn register<B: FaceDetector + 'static>(&mut self, backend: B) {
        let name = backend.name().to_string();
        if self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.backends.insert(name, Arc::new(Mutex::new(backend)));
    }

    /// Set default backend by name.
    pub fn set_default(&mut self, name: &str) -> Result<()> {
        if !self.backends.contains_key(name) {
            return Err(anyhow!("backend '{}' not registered", name));
        }
        self.default_name = Some(name.to_string());
        Ok(())
    }

    /// Get backend by name.
    pub fn get(&self, name: &str) -> Option<SharedDetector> {
        self.backends.get(name).cloned()
    }

    /// Get default backend.
    pub fn default_backend(&self) -> Option<SharedDetector> {
        self.default_name.as_ref().and_then(|name| self.get(name))
    }

    pub fn default_name(&self) -> Option<&str> {
        self.default_name.as_deref()
    }

    /// List registered backends, sorted by name.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.backends.keys().cloned().collect();
        names.sort();
        names
    }

    /// Select a backend that supports the requested capability.
    ///
    /// Prefers the default backend when it supports the capability.
    pub fn backend_for_capability(&self, capability: DetectionCapability) -> Result<SharedDetector> {
        if let Some(default_backend) = self.default_backend() {
            let supports = {
                let guard = default_backend
                    .lock()
                    .map_err(|_| anyhow!("default backend lock poisoned"))?;
                guard.supports(capability)
            };
            if supports {
                return Ok(default_backend);
            }
        }

        for name in self.list() {
            let Some(backend) = self.get(&name) else {
                continue;
            };
            let supports = {
                let guard = backend
                    .lock()
                    .map_err(|_| anyhow!("backend lock poisoned"))?;
                guard.supports(capability)
            };
            if supports {
                return Ok(backend);
            }
        }

        Err(anyhow!(
            "no registered backend supports capability {:?}",
            capability
        ))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::FaceObservation;
    use crate::frame::SourceImage;
    use crate::geometry::NormalizedRect;
    use image::RgbImage;
    use std::time::Duration;

    struct LandmarkOnly;

    impl FaceDetector for LandmarkOnly {
        fn name(&self) -> &'static str {
            "landmarks"
        }

        fn supports(&self, capability: DetectionCapability) -> bool {
            matches!(capability, DetectionCapability::FaceLandmarks)
        }

        fn detect(&mut self, _image: &SourceImage) -> Result<Vec<FaceObservation>> {
            Err(anyhow!("landmark backend cannot produce rectangles"))
        }
    }

    fn settings(backend: &str) -> DetectorSettings {
        DetectorSettings {
            backend: backend.to_string(),
            model_path: None,
            min_face_size: 20,
            score_threshold: 2.0,
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn first_registered_backend_is_default() {
        let mut registry = BackendRegistry::new();
        registry.register(LandmarkOnly);
        registry.register(StubBackend::new());
        assert_eq!(registry.default_name(), Some("landmarks"));
        assert_eq!(registry.list(), vec!["landmarks", "stub"]);
        assert!(registry.set_default("missing").is_err());
    }

    #[test]
    fn capability_lookup_skips_default_without_support() {
        let mut registry = BackendRegistry::new();
        registry.register(LandmarkOnly);
        registry.register(StubBackend::with_faces([NormalizedRect::unit()]));

        let image = SourceImage::from_rgb(RgbImage::new(4, 4)).unwrap();
        let backend = registry
            .backend_for_capability(DetectionCapability::FaceRectangles)
            .unwrap();
        let faces = backend.lock().unwrap().detect(&image).unwrap();
        assert_eq!(faces.len(), 1);
    }

    #[test]
    fn missing_capability_is_an_error() {
        let mut registry = BackendRegistry::new();
        registry.register(StubBackend::new());
        assert!(registry
            .backend_for_capability(DetectionCapability::FaceLandmarks)
            .is_err());
    }

    #[test]
    fn builds_stub_registry_from_settings() {
        let registry = BackendRegistry::from_settings(&settings("stub")).unwrap();
        assert_eq!(registry.default_name(), Some("stub"));
        assert!(BackendRegistry::from_settings(&settings("opencv")).is_err());
    }

    #[test]
    fn configured_registry_serves_face_rectangles() {
        let registry = BackendRegistry::from_settings(&settings("stub")).unwrap();
        let backend = registry
            .backend_for_capability(DetectionCapability::FaceRectangles)
            .unwrap();
        assert_eq!(backend.lock().unwrap().name(), "stub");
    }

    #[cfg(not(feature = "backend-rustface"))]
    #[test]
    fn rustface_requires_feature() {
        let err = BackendRegistry::from_settings(&settings("rustface"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("backend-rustface"));
    }
}

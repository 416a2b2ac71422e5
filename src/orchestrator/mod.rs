//! # Render Orchestrator
//!
//! Drives one surface through render passes:
//!
//! ```text
//! Idle ──render()──▶ Rendering ──▶ Complete
//!                              └─▶ AwaitingAssets ──complete()──▶ Rendering ...
//! ```
//!
//! Every pass clears the surface and paints the whole element list in
//! sequence order, so the composite after any redraw reflects z-order no
//! matter in which order image loads finish.
//!
//! Image loads are plain values. [`RenderOrchestrator::render`] hands back
//! one [`AssetLoad`] per image it could not paint yet; the caller runs them
//! (see [`AssetLoad::run`]) and feeds each [`AssetCompletion`] back through
//! [`RenderOrchestrator::complete`]. Each load carries the generation of the
//! pass that asked for it. Starting a new pass bumps the generation, and a
//! completion from an older generation is dropped without touching the
//! surface or the shared cache.

use image::RgbaImage;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::assets::{AssetContext, ImageCache, ImageSource};
use crate::document::{Document, Element};
use crate::render::{self, Degradation, ImageLookup, ImageState, RenderContext};
use crate::surface::{Color, Surface};

/// Render pass counter.
pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    Idle,
    Rendering,
    Complete,
    AwaitingAssets,
}

/// A request to load one image for a given pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLoad {
    pub url: String,
    pub generation: Generation,
}

impl AssetLoad {
    /// Fetch and decode the image. Never fails: errors are carried in the
    /// completion.
    pub async fn run(self, source: &dyn ImageSource) -> AssetCompletion {
        let result = source
            .fetch(&self.url)
            .await
            .map(|img| Arc::new(img.to_rgba8()))
            .map_err(|e| e.to_string());
        AssetCompletion {
            url: self.url,
            generation: self.generation,
            result,
        }
    }
}

/// Outcome of an [`AssetLoad`].
#[derive(Debug, Clone)]
pub struct AssetCompletion {
    pub url: String,
    pub generation: Generation,
    pub result: Result<Arc<RgbaImage>, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Applied; the surface was repainted.
    Redrawn,
    /// From an older pass; ignored.
    Superseded,
}

/// Passed to the redraw callback after every completed paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawEvent {
    pub generation: Generation,
    /// Total paints of this surface so far, starting at 1.
    pub redraw: u64,
    pub state: PassState,
}

type RedrawCallback<S> = Box<dyn FnMut(&S, &RedrawEvent) + Send>;

/// Image availability for one pass: failures first, then images this
/// orchestrator resolved, then the shared cache.
struct PassImages<'a> {
    resolved: &'a HashMap<String, Arc<RgbaImage>>,
    failures: &'a HashMap<String, String>,
    cache: &'a ImageCache,
}

impl ImageLookup for PassImages<'_> {
    fn lookup(&self, src: &str) -> ImageState {
        if let Some(reason) = self.failures.get(src) {
            return ImageState::Failed(reason.clone());
        }
        if let Some(image) = self.resolved.get(src) {
            return ImageState::Ready(image.clone());
        }
        match self.cache.get(src) {
            Some(image) => ImageState::Ready(image),
            None => ImageState::Missing,
        }
    }
}

/// Owns one surface and repaints it as assets arrive.
pub struct RenderOrchestrator<S: Surface> {
    surface: S,
    assets: AssetContext,
    resolved: HashMap<String, Arc<RgbaImage>>,
    failures: HashMap<String, String>,
    elements: Vec<Element>,
    generation: Generation,
    state: PassState,
    in_flight: HashSet<String>,
    unresolved: Vec<String>,
    degradations: Vec<Degradation>,
    redraws: u64,
    on_redraw: Option<RedrawCallback<S>>,
}

impl<S: Surface> RenderOrchestrator<S> {
    pub fn new(surface: S, assets: AssetContext) -> Self {
        Self {
            surface,
            assets,
            resolved: HashMap::new(),
            failures: HashMap::new(),
            elements: Vec::new(),
            generation: 0,
            state: PassState::Idle,
            in_flight: HashSet::new(),
            unresolved: Vec::new(),
            degradations: Vec::new(),
            redraws: 0,
            on_redraw: None,
        }
    }

    /// Register a callback invoked once after every paint.
    pub fn on_redraw(mut self, callback: impl FnMut(&S, &RedrawEvent) + Send + 'static) -> Self {
        self.on_redraw = Some(Box::new(callback));
        self
    }

    pub fn state(&self) -> PassState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Elements drawn with a fallback in the latest paint.
    pub fn degradations(&self) -> &[Degradation] {
        &self.degradations
    }

    /// Images still showing the loading placeholder.
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    /// Images that failed to load for this orchestrator.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.failures.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Start a new pass over `document`, with element geometry multiplied by
    /// `scale`. Returns the loads the caller should run.
    pub fn render(&mut self, document: &Document, scale: f32) -> Vec<AssetLoad> {
        self.elements = document.elements.iter().map(|e| e.scaled(scale)).collect();
        self.start_pass()
    }

    /// Forget failed loads and repaint, requesting them again.
    pub fn retry_failed(&mut self) -> Vec<AssetLoad> {
        self.failures.clear();
        self.start_pass()
    }

    fn start_pass(&mut self) -> Vec<AssetLoad> {
        self.generation += 1;
        self.in_flight.clear();
        log::debug!(
            "render pass {} over {} elements",
            self.generation,
            self.elements.len()
        );
        self.paint();
        self.pending_loads()
    }

    /// Apply a finished load.
    pub fn complete(&mut self, completion: AssetCompletion) -> CompletionOutcome {
        if completion.generation != self.generation {
            log::debug!(
                "dropping stale load of {} (pass {}, current {})",
                completion.url,
                completion.generation,
                self.generation
            );
            return CompletionOutcome::Superseded;
        }
        self.in_flight.remove(&completion.url);
        match completion.result {
            Ok(image) => {
                self.assets.images.insert(completion.url.clone(), image.clone());
                self.resolved.insert(completion.url, image);
            }
            Err(reason) => {
                log::warn!("image {} failed to load: {}", completion.url, reason);
                self.failures.insert(completion.url, reason);
            }
        }
        self.paint();
        CompletionOutcome::Redrawn
    }

    /// Run `loads` one after another through the image source, applying each.
    pub async fn resolve(&mut self, loads: Vec<AssetLoad>) {
        let source = self.assets.source.clone();
        for load in loads {
            let completion = load.run(source.as_ref()).await;
            self.complete(completion);
        }
    }

    /// Render and wait until every image is painted or has definitively failed.
    pub async fn render_to_completion(&mut self, document: &Document, scale: f32) {
        let loads = self.render(document, scale);
        self.resolve(loads).await;
    }

    fn pending_loads(&mut self) -> Vec<AssetLoad> {
        let mut loads = Vec::new();
        for url in &self.unresolved {
            if self.in_flight.insert(url.clone()) {
                loads.push(AssetLoad {
                    url: url.clone(),
                    generation: self.generation,
                });
            }
        }
        loads
    }

    /// Full repaint from the first element.
    fn paint(&mut self) {
        self.state = PassState::Rendering;
        self.surface.clear(Color::WHITE);

        let lookup = PassImages {
            resolved: &self.resolved,
            failures: &self.failures,
            cache: &self.assets.images,
        };
        let mut ctx = RenderContext::new(&lookup, self.assets.symbols.as_ref());
        render::render_elements(&mut self.surface, &self.elements, &mut ctx);
        self.unresolved = ctx.unresolved;
        self.degradations = ctx.degradations;

        self.state = if self.unresolved.is_empty() {
            PassState::Complete
        } else {
            PassState::AwaitingAssets
        };
        self.redraws += 1;
        let event = RedrawEvent {
            generation: self.generation,
            redraw: self.redraws,
            state: self.state,
        };
        if let Some(callback) = self.on_redraw.as_mut() {
            callback(&self.surface, &event);
        }
    }
}

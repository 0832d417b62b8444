use image::DynamicImage;
use std::sync::Arc;

use crate::models::{BoundingBox, ProposalSet, ShapeLabel};

/// One image-to-image stage of mask preparation
pub trait PipelineStep: Send + Sync {
    /// Produce a new image from `image`; the input is never modified
    fn process(&self, image: &DynamicImage) -> DynamicImage;

    /// Human-readable name for this step (used in logs and debug file names)
    fn name(&self) -> &str;
}

/// Receives intermediate results of a proposal run.
///
/// All methods default to doing nothing, so implementors only override what
/// they need. Observers cannot fail the run.
pub trait PipelineObserver {
    /// The color image the run started from
    fn on_input(&mut self, _image: &DynamicImage) {}

    /// Output of step `index` (1-based)
    fn on_stage(&mut self, _index: usize, _name: &str, _image: &DynamicImage) {}

    /// A contour passed every filter and was added to the proposal set
    fn on_proposal(&mut self, _label: ShapeLabel, _bbox: &BoundingBox) {}

    fn on_finish(&mut self, _proposals: &ProposalSet) {}
}

/// Observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Adapts a closure over accepted `(label, box)` pairs into an observer
pub struct ProposalCallback<F>(pub F);

impl<F> PipelineObserver for ProposalCallback<F>
where
    F: FnMut(ShapeLabel, &BoundingBox),
{
    fn on_proposal(&mut self, label: ShapeLabel, bbox: &BoundingBox) {
        (self.0)(label, bbox)
    }
}

/// Composable sequence of image steps
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a processing step to the pipeline
    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    /// Helper method to add a step from a Box (for convenience)
    pub fn add_step_boxed(mut self, step: Box<dyn PipelineStep>) -> Self {
        self.steps.push(Arc::from(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order, reporting each output to `observer`
    pub fn run(&self, input: &DynamicImage, observer: &mut dyn PipelineObserver) -> DynamicImage {
        self.run_partial(input, self.steps.len(), observer)
    }

    /// Run only the first `num_steps` steps (useful for inspecting a stage)
    pub fn run_partial(
        &self,
        input: &DynamicImage,
        num_steps: usize,
        observer: &mut dyn PipelineObserver,
    ) -> DynamicImage {
        let mut current: Option<DynamicImage> = None;

        for (i, step) in self.steps.iter().take(num_steps).enumerate() {
            let source = current.as_ref().unwrap_or(input);
            tracing::debug!(
                step = step.name(),
                width = source.width(),
                height = source.height(),
                "running step"
            );
            let output = step.process(source);
            observer.on_stage(i + 1, step.name(), &output);
            current = Some(output);
        }

        current.unwrap_or_else(|| input.clone())
    }
}

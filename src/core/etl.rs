use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn into_pipeline(self) -> P {
        self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("🚀 Starting consolidation");

        // Extract
        let sheet = self.pipeline.extract().await?;
        tracing::debug!("Extracted {} rows", sheet.len());

        // Transform
        let report = self.pipeline.transform(sheet).await?;
        tracing::debug!(
            "Transformed into {} rows, {} issues",
            report.rows.len(),
            report.issues.len()
        );

        // Load
        let output_path = self.pipeline.load(report).await?;
        tracing::info!(
            "✅ Finished in {:.2}s, output saved to {}",
            started.elapsed().as_secs_f64(),
            output_path
        );

        Ok(output_path)
    }
}

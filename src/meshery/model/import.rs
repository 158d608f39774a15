use std::path::Path;

use tracing::{info, instrument};

use crate::meshery::model::archive::ModelPayload;
use crate::meshery::model::client::{RegistrationRequest, RegistryClient};
use crate::meshery::model::error::{ImportError, Result};
use crate::meshery::model::report::{build_report, render};
use crate::meshery::model::response::RegistryResponse;
use crate::meshery::model::sink::ReportSink;

/// Packages `path`, registers it and renders the registry's answer.
///
/// Input and transport failures abort before anything is rendered. Malformed
/// records in the reply are skipped and listed in the returned response's
/// diagnostics.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn import_model(
    path: &Path,
    client: &RegistryClient,
    sink: &mut dyn ReportSink,
) -> Result<RegistryResponse> {
    let payload = ModelPayload::from_path(path)?;
    info!(
        file_name = %payload.file_name,
        size = payload.data.len(),
        kind = ?payload.kind,
        "prepared model payload"
    );

    let request = RegistrationRequest::from_payload(payload);
    let response = client.register(&request)?;
    report_response(&response, sink)?;
    Ok(response)
}

/// Renders an already decoded response.
pub fn report_response(response: &RegistryResponse, sink: &mut dyn ReportSink) -> Result<()> {
    let blocks = build_report(response);
    info!(
        blocks = blocks.len(),
        skipped_records = response.diagnostics.len(),
        "rendering registry report"
    );
    render(&blocks, sink).map_err(ImportError::Output)
}

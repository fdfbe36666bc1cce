use anyhow::Context as _;
use lungscope_client::transport::RestTransport;
use lungscope_client::{InferenceConfig, TransportKind};

use crate::{print_success, print_warn};

pub fn handle_command(config: &InferenceConfig) -> anyhow::Result<()> {
    if config.transport != TransportKind::Rest {
        print_warn!(
            "Health checks only exist on the REST backend; ignoring the {} transport.",
            config.transport
        );
    }

    let rest_config = InferenceConfig {
        transport: TransportKind::Rest,
        ..config.clone()
    };
    rest_config.validate()?;
    let base = rest_config.api_base.as_deref().unwrap_or_default();

    let rest = RestTransport::new(base, config.request_timeout)?;
    let health = rest
        .health()
        .with_context(|| format!("Prediction server at {base} is not healthy"))?;

    print_success!(
        "{base} is {} (model {})",
        health.status,
        health.model_version.as_deref().unwrap_or("unknown")
    );
    Ok(())
}

use super::TrackingService;
use crate::component::OptionHandler;
use crate::error::TrackerError;
use crate::flow::{FlowNode, FlowSerializer, SetupDescriptor};
use tracing::{debug, info};

/// Returns the id of `flow`, uploading it first if the service does not know it yet.
///
/// A failing existence probe is an error, not a missing flow.
pub fn register_flow<S>(service: &mut S, flow: &FlowNode) -> Result<u32, TrackerError>
where
    S: TrackingService + ?Sized,
{
    if let Some(id) = service.flow_exists(&flow.name, &flow.external_version)? {
        debug!(flow = %flow.name, id, "Flow already registered");
        return Ok(id);
    }
    let id = service.flow_upload(flow)?;
    info!(flow = %flow.name, id, "Registered flow");
    Ok(id)
}

/// Looks up the setup id of a configured component.
///
/// Returns `Ok(None)` when either its flow or the setup itself is unknown to the service.
pub fn find_setup_id<S>(
    service: &S,
    serializer: &FlowSerializer,
    component: &dyn OptionHandler,
) -> Result<Option<u32>, TrackerError>
where
    S: TrackingService + ?Sized,
{
    let untagged = serializer.serialize(component, &[])?;
    let Some(flow_id) = service.flow_exists(&untagged.name, &untagged.external_version)? else {
        return Ok(None);
    };
    let flow = service.flow_get(flow_id)?;
    let settings = serializer.extract_setup(&component.get_options(), &flow)?;
    service.setup_exists(&SetupDescriptor { flow_id, settings })
}

//! Conversions from the serde job definition records into Batch SDK types.

use aws_sdk_batch::types::{
    ConsumableResourceProperties, ConsumableResourceRequirement, ContainerProperties,
    EfsAuthorizationConfig, EfsAuthorizationConfigIam, EfsTransitEncryption,
    EfsVolumeConfiguration, EvaluateOnExit, Host, JobTimeout, KeyValuePair, MountPoint,
    ResourceRequirement, ResourceType, RetryAction, RetryStrategy, Volume,
};
use model::spec;

pub(crate) fn container_properties(props: &spec::ContainerProperties) -> ContainerProperties {
    let volumes: Vec<Volume> = props.volumes.iter().map(volume).collect();

    let resource_requirements: Vec<ResourceRequirement> = props
        .resource_requirements
        .iter()
        .map(|requirement| {
            ResourceRequirement::builder()
                .value(requirement.value.as_str())
                .r#type(ResourceType::from(requirement.resource_type.as_str()))
                .build()
        })
        .collect();

    let mount_points: Vec<MountPoint> = props
        .mount_points
        .iter()
        .map(|mount| {
            MountPoint::builder()
                .set_container_path(mount.container_path.clone())
                .set_read_only(mount.read_only)
                .set_source_volume(mount.source_volume.clone())
                .build()
        })
        .collect();

    ContainerProperties::builder()
        .set_image(props.image.clone())
        .set_command(non_empty(props.command.clone()))
        .set_job_role_arn(props.job_role_arn.clone())
        .set_execution_role_arn(props.execution_role_arn.clone())
        .set_volumes(non_empty(volumes))
        .set_environment(Some(environment(&props.environment)))
        .set_mount_points(non_empty(mount_points))
        .set_resource_requirements(non_empty(resource_requirements))
        .build()
}

fn volume(volume: &spec::Volume) -> Volume {
    Volume::builder()
        .name(volume.name.as_str())
        .set_host(volume.host.as_ref().map(|host| {
            Host::builder()
                .set_source_path(host.source_path.clone())
                .build()
        }))
        .set_efs_volume_configuration(volume.efs_volume_configuration.as_ref().map(efs_volume))
        .build()
}

fn efs_volume(efs: &spec::EfsVolumeConfiguration) -> EfsVolumeConfiguration {
    let authorization: Option<EfsAuthorizationConfig> =
        efs.authorization_config.as_ref().map(|config| {
            EfsAuthorizationConfig::builder()
                .set_access_point_id(config.access_point_id.clone())
                .set_iam(config.iam.as_deref().map(EfsAuthorizationConfigIam::from))
                .build()
        });

    EfsVolumeConfiguration::builder()
        .file_system_id(efs.file_system_id.as_str())
        .set_root_directory(efs.root_directory.clone())
        .set_transit_encryption(
            efs.transit_encryption
                .as_deref()
                .map(EfsTransitEncryption::from),
        )
        .set_transit_encryption_port(efs.transit_encryption_port)
        .set_authorization_config(authorization)
        .build()
}

pub(crate) fn consumable_resource_properties(
    props: &spec::ConsumableResourceProperties,
) -> ConsumableResourceProperties {
    let requirements: Vec<ConsumableResourceRequirement> = props
        .consumable_resource_list
        .iter()
        .map(|requirement| {
            ConsumableResourceRequirement::builder()
                .consumable_resource(requirement.consumable_resource.as_str())
                .quantity(requirement.quantity)
                .build()
        })
        .collect();

    ConsumableResourceProperties::builder()
        .set_consumable_resource_list(Some(requirements))
        .build()
}

pub(crate) fn timeout(timeout: &spec::JobTimeout) -> JobTimeout {
    JobTimeout::builder()
        .set_attempt_duration_seconds(timeout.attempt_duration_seconds)
        .build()
}

pub(crate) fn retry_strategy(strategy: &spec::RetryStrategy) -> RetryStrategy {
    let evaluate_on_exit: Vec<EvaluateOnExit> = strategy
        .evaluate_on_exit
        .iter()
        .map(|condition| {
            EvaluateOnExit::builder()
                .set_on_status_reason(condition.on_status_reason.clone())
                .set_on_reason(condition.on_reason.clone())
                .set_on_exit_code(condition.on_exit_code.clone())
                .action(RetryAction::from(condition.action.as_str()))
                .build()
        })
        .collect();

    RetryStrategy::builder()
        .set_attempts(strategy.attempts)
        .set_evaluate_on_exit(non_empty(evaluate_on_exit))
        .build()
}

fn environment(pairs: &[spec::KeyValuePair]) -> Vec<KeyValuePair> {
    pairs
        .iter()
        .map(|pair| {
            KeyValuePair::builder()
                .name(pair.name.as_str())
                .value(pair.value.as_str())
                .build()
        })
        .collect()
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::SystemTime;

use drover_model::{
    ActiveInstanceCache, ClusterEvent, ClusterSyncEvent, ContainerHost, ContainerTask,
    LifecycleEventKind, VmInstance,
};

/// Result of one diff pass: events to publish, the replacement cache entry
/// and the cluster-level snapshot event.
#[derive(Debug)]
pub struct ClusterDiff {
    pub events: Vec<ClusterEvent>,
    pub cache: ActiveInstanceCache,
    pub sync: ClusterSyncEvent,
}

/// Reconstruct start/stop transitions for a cluster from the previous cache
/// and the current point-in-time snapshot.
///
/// Pure: no IO, no clock reads; `now` is the poll instant supplied by the
/// caller. The returned cache holds exactly this run's computed active sets
/// (whole-set replacement, not a union with the old cache) with
/// `last_processed` advanced to `now`. The metrics watermark is carried over
/// untouched; the executor owns that field.
pub fn diff_cluster(
    cluster_id: &str,
    cache: &ActiveInstanceCache,
    hosts: &[ContainerHost],
    vms: &[VmInstance],
    service_tasks: &BTreeMap<String, BTreeSet<String>>,
    tasks: &[ContainerTask],
    now: SystemTime,
) -> ClusterDiff {
    let mut events = Vec::new();

    let active_vm_ids = diff_vms(cluster_id, cache, vms, now, &mut events);
    let active_host_arns = diff_hosts(cluster_id, cache, hosts, now, &mut events);
    let active_task_arns = diff_tasks(cluster_id, cache, service_tasks, tasks, now, &mut events);

    let new_cache = ActiveInstanceCache {
        active_vm_ids: active_vm_ids.clone(),
        active_host_arns: active_host_arns.clone(),
        active_task_arns: active_task_arns.clone(),
        last_processed: now,
        metrics_collected_till_hour: cache.metrics_collected_till_hour,
    };

    let sync = ClusterSyncEvent {
        cluster_id: cluster_id.to_string(),
        active_vm_ids,
        active_host_arns,
        active_task_arns,
        watermark: now,
    };

    ClusterDiff {
        events,
        cache: new_cache,
        sync,
    }
}

fn lifecycle(
    cluster_id: &str,
    resource_id: &str,
    kind: LifecycleEventKind,
    timestamp: SystemTime,
) -> ClusterEvent {
    ClusterEvent::Lifecycle {
        cluster_id: cluster_id.to_string(),
        resource_id: resource_id.to_string(),
        kind,
        timestamp,
    }
}

fn diff_vms(
    cluster_id: &str,
    cache: &ActiveInstanceCache,
    vms: &[VmInstance],
    now: SystemTime,
    events: &mut Vec<ClusterEvent>,
) -> BTreeSet<String> {
    let mut active = BTreeSet::new();

    for vm in vms {
        // A terminated VM stops now and never enters the active set, even
        // when this is its first sighting.
        if vm.is_terminated() {
            events.push(lifecycle(cluster_id, &vm.vm_id, LifecycleEventKind::Stop, now));
            continue;
        }

        if !cache.active_vm_ids.contains(&vm.vm_id) {
            // Timestamp at the VM's own launch time so downstream ordering
            // survives polling latency.
            events.push(lifecycle(
                cluster_id,
                &vm.vm_id,
                LifecycleEventKind::Start,
                vm.launched_at,
            ));
            events.push(ClusterEvent::VmDescription {
                cluster_id: cluster_id.to_string(),
                vm_id: vm.vm_id.clone(),
                instance_type: vm.instance_type.clone(),
                capacity_reservation_id: vm.capacity_reservation_id.clone(),
                spot_request_id: vm.spot_request_id.clone(),
                lifecycle: vm.lifecycle.clone(),
                timestamp: vm.launched_at,
            });
        }
        active.insert(vm.vm_id.clone());
    }

    // Cached ids the describe call no longer returns: the provider already
    // reaped the resource, so the exact stop time is unrecoverable.
    let listed: BTreeSet<&str> = vms.iter().map(|vm| vm.vm_id.as_str()).collect();
    for vm_id in &cache.active_vm_ids {
        if !listed.contains(vm_id.as_str()) {
            events.push(lifecycle(cluster_id, vm_id, LifecycleEventKind::Stop, now));
        }
    }

    active
}

fn diff_hosts(
    cluster_id: &str,
    cache: &ActiveInstanceCache,
    hosts: &[ContainerHost],
    now: SystemTime,
    events: &mut Vec<ClusterEvent>,
) -> BTreeSet<String> {
    let mut active = BTreeSet::new();

    for host in hosts {
        if host.registered_at > cache.last_processed {
            events.push(lifecycle(
                cluster_id,
                &host.arn,
                LifecycleEventKind::Start,
                host.registered_at,
            ));
            events.push(ClusterEvent::HostDescription {
                cluster_id: cluster_id.to_string(),
                arn: host.arn.clone(),
                cpu: host.cpu,
                memory_mb: host.memory_mb,
                os_type: host.os_type.clone(),
                timestamp: host.registered_at,
            });
        }
        active.insert(host.arn.clone());
    }

    for arn in &cache.active_host_arns {
        if !active.contains(arn) {
            events.push(lifecycle(cluster_id, arn, LifecycleEventKind::Stop, now));
        }
    }

    active
}

fn diff_tasks(
    cluster_id: &str,
    cache: &ActiveInstanceCache,
    service_tasks: &BTreeMap<String, BTreeSet<String>>,
    tasks: &[ContainerTask],
    now: SystemTime,
    events: &mut Vec<ClusterEvent>,
) -> BTreeSet<String> {
    // Invert service -> arns for the description linkage.
    let mut service_of: HashMap<&str, &str> = HashMap::new();
    for (service, arns) in service_tasks {
        for arn in arns {
            service_of.insert(arn.as_str(), service.as_str());
        }
    }

    let mut active = BTreeSet::new();

    for task in tasks {
        let was_cached = cache.active_task_arns.contains(&task.arn);

        // An uncached task whose stop predates the last processed window was
        // fully handled (START and STOP) in an earlier run; providers keep
        // listing stopped tasks for a while after the fact.
        let already_processed = !was_cached
            && task
                .stopped_at
                .is_some_and(|stopped| stopped < cache.last_processed);
        if already_processed {
            continue;
        }

        if !was_cached && let Some(pull_started) = task.pull_started_at {
            events.push(lifecycle(
                cluster_id,
                &task.arn,
                LifecycleEventKind::Start,
                pull_started,
            ));
            events.push(ClusterEvent::TaskDescription {
                cluster_id: cluster_id.to_string(),
                arn: task.arn.clone(),
                service_name: task
                    .service_name
                    .clone()
                    .or_else(|| service_of.get(task.arn.as_str()).map(|s| s.to_string())),
                host_arn: task.host_arn.clone(),
                cpu: task.cpu,
                memory_mb: task.memory_mb,
                timestamp: pull_started,
            });
        }

        if let Some(stopped_at) = task.stopped_at {
            events.push(lifecycle(
                cluster_id,
                &task.arn,
                LifecycleEventKind::Stop,
                stopped_at,
            ));
        } else {
            active.insert(task.arn.clone());
        }
    }

    let listed: BTreeSet<&str> = tasks.iter().map(|t| t.arn.as_str()).collect();
    for arn in &cache.active_task_arns {
        if !listed.contains(arn.as_str()) {
            events.push(lifecycle(cluster_id, arn, LifecycleEventKind::Stop, now));
        }
    }

    active
}

//! Automatic package generation by mesh similarity.
//!
//! Greedy clustering: take the first unclaimed shape as a seed, move every
//! remaining shape the host judges topologically identical into the seed's
//! cluster, turn the cluster into a package, repeat. Worst case O(n^2)
//! similarity checks.
//!
//! Shapes that share topology but were meant to be different assets (for
//! example meshes with frozen transforms) end up in the same package; the
//! host's comparison cannot tell them apart.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::package::{PackageId, PackageRegistry};
use crate::scene::{ObjectId, SceneHost};
use crate::util::sanitize_file_name;

/// Shared cancellation flag, polled between and during cluster scans.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Progress after each completed package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GroupProgress {
    /// Packages created so far.
    pub packages: usize,
    /// Shapes claimed so far.
    pub claimed: usize,
    pub total: usize,
}

/// Outcome of [`auto_group`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupReport {
    /// New packages in creation order.
    pub created: Vec<PackageId>,
    /// Shapes left without a package (only non-zero when cancelled).
    pub unclustered: Vec<ObjectId>,
    pub cancelled: bool,
}

/// Cluster every visible mesh transform into new packages.
///
/// Each package is named after its first member. Packages are only created
/// once their cluster scan completed; a scan interrupted by `cancel` leaves
/// its shapes unclustered. Afterwards the first package in the registry
/// becomes current.
pub fn auto_group<H, P>(host: &H, registry: &mut PackageRegistry, cancel: &CancelToken, mut progress: P) -> GroupReport
where
    H: SceneHost + ?Sized,
    P: FnMut(GroupProgress),
{
    let _span = info_span!("auto_group").entered();
    let mut pool: VecDeque<ObjectId> = host.mesh_transforms().into();
    let total = pool.len();
    let mut report = GroupReport::default();

    if pool.is_empty() {
        info!("no mesh transforms in scene, nothing to group");
        return report;
    }

    info!("auto-generating packages from {} shapes", total);
    let mut claimed = 0usize;

    while let Some(&seed) = pool.front() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        pool.pop_front();

        let mut cluster = vec![seed];
        let mut i = 0;
        let mut interrupted = false;
        while i < pool.len() {
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }
            if host.are_similar(seed, pool[i]) {
                if let Some(shape) = pool.remove(i) {
                    cluster.push(shape);
                }
            } else {
                // only advance past non-matches; a removal shifts the next shape into `i`
                i += 1;
            }
        }

        if interrupted {
            report.cancelled = true;
            report.unclustered.extend(cluster);
            break;
        }

        claimed += cluster.len();
        let pack = registry.add_package();
        let id = pack.id();
        pack.add_or_update_members(host, &cluster);
        let first = pack.members().first().map(|m| m.name().to_string());

        match first {
            Some(first) => {
                let name = unique_package_name(registry, id, &first);
                if let Some(pack) = registry.get_mut(id) {
                    pack.set_display_name(&name);
                }
                debug!("package '{}' <- {} shapes", name, cluster.len());
                report.created.push(id);
            }
            None => {
                debug!("cluster of {} shapes could not be captured, discarded", cluster.len());
                if let Err(e) = registry.remove_package(id) {
                    warn!("failed to discard empty package {}: {}", id, e);
                }
            }
        }

        progress(GroupProgress { packages: report.created.len(), claimed, total });
    }

    report.unclustered.extend(pool);

    if let Some(first) = registry.packages().first().map(|p| p.id()) {
        let _ = registry.set_current(first);
    }

    info!(
        "auto-grouping {}: {} package(s), {} shape(s) unclustered",
        if report.cancelled { "cancelled" } else { "finished" },
        report.created.len(),
        report.unclustered.len()
    );
    report
}

/// `base`, or `base_2`, `base_3`, ... when another package already has that
/// file name. Short names need not be unique in a host scene.
fn unique_package_name(registry: &PackageRegistry, own: PackageId, base: &str) -> String {
    let base = sanitize_file_name(base);
    let taken = |name: &str| registry.iter().any(|p| p.id() != own && p.file_base_name() == name);
    if !taken(&base) {
        return base;
    }
    (2u32..)
        .map(|n| format!("{base}_{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| format!("{base}_{}", registry.len()))
}

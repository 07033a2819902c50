/// Queue and physical device selection
///
/// Resolves which queue family/index serves each `QueueType` on a candidate
/// GPU, and picks the GPU itself. Pure functions over queried capabilities,
/// so the backend only has to fill in `PhysicalDeviceCandidate`s.

use rustc_hash::FxHashMap;
use crate::device::physical_device::PhysicalDeviceCandidate;
use crate::device::queue::{QueueFamily, QueueFlags, QueueType};
use crate::error::{Error, Result};

/// One device queue chosen for a role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAssignment {
    pub family_index: u32,
    pub queue_index: u32,
    pub flags: QueueFlags,
    /// Claimed for presenting to the surface
    pub surface_bound: bool,
}

/// Queue assignments of one device
///
/// Built append-only by `select_queues`; read-only afterwards.
#[derive(Debug, Clone)]
pub struct QueueAssignments {
    families: Vec<QueueFamily>,
    by_type: FxHashMap<QueueType, QueueAssignment>,
    /// Queues claimed so far per family
    used: FxHashMap<u32, u32>,
}

impl QueueAssignments {
    fn new(families: &[QueueFamily]) -> Self {
        Self {
            families: families.to_vec(),
            by_type: FxHashMap::default(),
            used: FxHashMap::default(),
        }
    }

    /// First family with all `required` flags, none of `unwanted`, present
    /// support when asked, and at least one unclaimed queue
    fn find_family(&self, required: QueueFlags, unwanted: QueueFlags, present: bool) -> Option<u32> {
        self.families.iter().enumerate().find_map(|(index, family)| {
            let index = index as u32;
            let suitable = family.flags.contains(required)
                && !family.flags.intersects(unwanted)
                && (!present || family.present_support)
                && self.queue_count(index) < family.queue_count;
            suitable.then_some(index)
        })
    }

    /// Claim the next free queue of `family` for every role in `types`
    fn claim(&mut self, family: u32, types: &[QueueType], surface_bound: bool) -> QueueAssignment {
        let used = self.used.entry(family).or_insert(0);
        let assignment = QueueAssignment {
            family_index: family,
            queue_index: *used,
            flags: self.families[family as usize].flags,
            surface_bound,
        };
        *used += 1;
        for queue_type in types {
            self.by_type.insert(*queue_type, assignment);
        }
        assignment
    }

    /// Reuse an existing assignment for another role
    fn alias(&mut self, queue_type: QueueType, of: QueueType) {
        if let Some(assignment) = self.by_type.get(&of).copied() {
            self.by_type.insert(queue_type, assignment);
        }
    }

    /// Queue serving `queue_type`
    pub fn get(&self, queue_type: QueueType) -> Option<&QueueAssignment> {
        self.by_type.get(&queue_type)
    }

    pub fn has(&self, queue_type: QueueType) -> bool {
        self.by_type.contains_key(&queue_type)
    }

    /// Number of distinct queues claimed from `family`
    pub fn queue_count(&self, family: u32) -> u32 {
        self.used.get(&family).copied().unwrap_or(0)
    }

    /// Distinct family indices in use, ascending
    pub fn family_indices(&self) -> Vec<u32> {
        let mut families: Vec<u32> = self.used.keys().copied().collect();
        families.sort_unstable();
        families
    }

    /// Roles and their queues, ordered by role
    pub fn iter(&self) -> Vec<(QueueType, QueueAssignment)> {
        let mut entries: Vec<(QueueType, QueueAssignment)> =
            self.by_type.iter().map(|(t, a)| (*t, *a)).collect();
        entries.sort_by_key(|(t, _)| *t);
        entries
    }

    /// Families the swapchain images are shared between (GRAPHICS and PRESENT)
    pub fn presentation_families(&self) -> Vec<u32> {
        let mut families: Vec<u32> = [QueueType::Graphics, QueueType::Present]
            .iter()
            .filter_map(|t| self.get(*t).map(|a| a.family_index))
            .collect();
        families.dedup();
        families
    }

    /// Multi-line summary for logging
    pub fn describe(&self) -> String {
        self.iter()
            .iter()
            .map(|(queue_type, a)| {
                format!(
                    "{}: family {} index {} flags {:?}{}",
                    queue_type.name(),
                    a.family_index,
                    a.queue_index,
                    a.flags,
                    if a.surface_bound { " (can present)" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolve queue roles on one device
///
/// Priority:
/// 1. a dedicated COMPUTE family (COMPUTE without GRAPHICS)
/// 2. one GRAPHICS family that can present (also COMPUTE when step 1 failed)
/// 3. any GRAPHICS(+COMPUTE) family plus any present-capable family
/// 4. GRAPHICS, COMPUTE and PRESENT resolved independently
///
/// A dedicated TRANSFER family is claimed when available.
/// `present` = false resolves for headless use (no PRESENT role).
pub fn select_queues(families: &[QueueFamily], present: bool) -> Result<QueueAssignments> {
    let mut queues = QueueAssignments::new(families);
    let unwanted = QueueFlags::VIDEO;

    // 1. Dedicated compute
    if let Some(family) = queues.find_family(QueueFlags::COMPUTE, unwanted | QueueFlags::GRAPHICS, false) {
        queues.claim(family, &[QueueType::Compute], false);
    }
    let need_compute = !queues.has(QueueType::Compute);
    let graphics_flags = if need_compute {
        QueueFlags::GRAPHICS | QueueFlags::COMPUTE
    } else {
        QueueFlags::GRAPHICS
    };
    let graphics_roles: &[QueueType] = if need_compute {
        &[QueueType::Graphics, QueueType::Compute]
    } else {
        &[QueueType::Graphics]
    };

    if present {
        // 2. Combined graphics + present
        if let Some(family) = queues.find_family(graphics_flags, unwanted, true) {
            let mut roles = vec![QueueType::Present];
            roles.extend_from_slice(graphics_roles);
            queues.claim(family, &roles, true);
        }

        // 3. Graphics and present from different families
        if !queues.has(QueueType::Graphics) {
            if let Some(family) = queues.find_family(graphics_flags, unwanted, false) {
                queues.claim(family, graphics_roles, false);
            }
        }

        // 4. Everything independently
        if !queues.has(QueueType::Graphics) {
            if let Some(family) = queues.find_family(QueueFlags::GRAPHICS, unwanted, false) {
                queues.claim(family, &[QueueType::Graphics], false);
            }
        }
        if !queues.has(QueueType::Present) {
            if let Some(family) = queues.find_family(QueueFlags::empty(), unwanted, true) {
                queues.claim(family, &[QueueType::Present], true);
            }
        }
    } else {
        if let Some(family) = queues.find_family(graphics_flags, unwanted, false) {
            queues.claim(family, graphics_roles, false);
        }
        if !queues.has(QueueType::Graphics) {
            if let Some(family) = queues.find_family(QueueFlags::GRAPHICS, unwanted, false) {
                queues.claim(family, &[QueueType::Graphics], false);
            }
        }
    }

    if !queues.has(QueueType::Compute) {
        if let Some(family) = queues.find_family(QueueFlags::COMPUTE, unwanted, false) {
            queues.claim(family, &[QueueType::Compute], false);
        } else if queues
            .get(QueueType::Graphics)
            .is_some_and(|g| g.flags.contains(QueueFlags::COMPUTE))
        {
            queues.alias(QueueType::Compute, QueueType::Graphics);
        }
    }

    // Optional dedicated transfer
    if let Some(family) = queues.find_family(
        QueueFlags::TRANSFER,
        unwanted | QueueFlags::GRAPHICS | QueueFlags::COMPUTE,
        false,
    ) {
        queues.claim(family, &[QueueType::Transfer], false);
    }

    let mut missing = Vec::new();
    if !queues.has(QueueType::Graphics) {
        missing.push("GRAPHICS");
    }
    if present && !queues.has(QueueType::Present) {
        missing.push("PRESENT");
    }
    if !queues.has(QueueType::Compute) {
        missing.push("COMPUTE");
    }
    if !missing.is_empty() {
        return Err(Error::NoSuitableDevice(format!(
            "no usable queue family for {}",
            missing.join(", ")
        )));
    }

    Ok(queues)
}

/// Pick the physical device to use
///
/// `gpu_index >= 0` forces that enumeration index; `-1` picks the best
/// suitable candidate (discrete > integrated > virtual > cpu > other, first
/// in enumeration order on ties).
pub fn pick_physical_device(
    candidates: &[PhysicalDeviceCandidate],
    gpu_index: i32,
    present: bool,
) -> Result<(usize, QueueAssignments)> {
    if candidates.is_empty() {
        return Err(Error::NoSuitableDevice("no physical devices".to_string()));
    }

    if gpu_index >= 0 {
        let index = gpu_index as usize;
        let candidate = candidates.get(index).ok_or_else(|| {
            Error::NoSuitableDevice(format!(
                "gpu_index {} out of range ({} devices)",
                index,
                candidates.len()
            ))
        })?;
        let queues = select_queues(&candidate.queue_families, present).map_err(|e| {
            Error::NoSuitableDevice(format!("{} [{}]: {}", candidate.name, index, e))
        })?;
        return Ok((index, queues));
    }

    let mut best: Option<(usize, QueueAssignments)> = None;
    let mut reasons = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        match select_queues(&candidate.queue_families, present) {
            Ok(queues) => {
                let better = best
                    .as_ref()
                    .map_or(true, |(b, _)| candidate.kind.rank() < candidates[*b].kind.rank());
                if better {
                    best = Some((index, queues));
                }
            }
            Err(e) => reasons.push(format!("{}: {}", candidate.name, e)),
        }
    }

    best.ok_or_else(|| Error::NoSuitableDevice(reasons.join("; ")))
}

#[cfg(test)]
#[path = "queue_selector_tests.rs"]
mod tests;

/// Physical device scoring and queue family selection
///
/// Backends translate what the driver reports into [`DeviceCandidate`]
/// records; the rules that decide which device is used live here so they
/// can be exercised without a GPU.

use crate::error::{Error, Result};

/// Physical device class, as reported by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Discrete,
    Integrated,
    Virtual,
    Cpu,
    Other,
}

impl DeviceType {
    /// Base score before hard requirements are applied
    pub fn base_score(&self) -> u32 {
        match self {
            DeviceType::Discrete => 1000,
            DeviceType::Integrated => 500,
            DeviceType::Virtual => 250,
            DeviceType::Cpu => 10,
            DeviceType::Other => 0,
        }
    }
}

/// Capabilities of one queue family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyInfo {
    pub graphics: bool,
    pub compute: bool,
    /// Can present to the window surface
    pub present: bool,
}

/// Selected queue family index per role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
    pub compute: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some() && self.compute.is_some()
    }

    /// Distinct family indices (for queue create infos)
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families: Vec<u32> = [self.graphics, self.present, self.compute]
            .into_iter()
            .flatten()
            .collect();
        families.sort_unstable();
        families.dedup();
        families
    }
}

/// Walk the families in order, recording a family for every role it
/// supports, and stop as soon as every role has one
pub fn find_queue_families(families: &[QueueFamilyInfo]) -> QueueFamilyIndices {
    let mut indices = QueueFamilyIndices::default();
    for (i, family) in families.iter().enumerate() {
        let i = i as u32;
        if family.graphics {
            indices.graphics = Some(i);
        }
        if family.present {
            indices.present = Some(i);
        }
        if family.compute {
            indices.compute = Some(i);
        }
        if indices.is_complete() {
            break;
        }
    }
    indices
}

/// Everything the scorer needs to know about one physical device
#[derive(Debug, Clone)]
pub struct DeviceCandidate {
    pub name: String,
    pub device_type: DeviceType,
    pub queue_families: QueueFamilyIndices,
    /// Required extensions the device does not expose
    pub missing_extensions: Vec<String>,
    pub surface_format_count: usize,
    pub present_mode_count: usize,
    pub sampler_anisotropy: bool,
}

impl DeviceCandidate {
    /// Hard requirements that are not met (empty when the device qualifies)
    pub fn unmet_requirements(&self) -> Vec<String> {
        let mut unmet = Vec::new();
        if !self.queue_families.is_complete() {
            unmet.push("incomplete graphics/present/compute queue families".to_string());
        }
        for ext in &self.missing_extensions {
            unmet.push(format!("missing extension {}", ext));
        }
        if self.surface_format_count == 0 {
            unmet.push("no surface formats".to_string());
        }
        if self.present_mode_count == 0 {
            unmet.push("no present modes".to_string());
        }
        if !self.sampler_anisotropy {
            unmet.push("no sampler anisotropy".to_string());
        }
        unmet
    }
}

/// Score a device; zero means disqualified
pub fn score_device(candidate: &DeviceCandidate) -> u32 {
    if candidate.unmet_requirements().is_empty() {
        candidate.device_type.base_score()
    } else {
        0
    }
}

/// Index of the highest-scoring candidate
///
/// Ties keep the earliest enumerated device. Fails when no candidate scores
/// above zero.
pub fn select_device(candidates: &[DeviceCandidate]) -> Result<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        let score = score_device(candidate);
        crate::engine_debug!(
            "lumen::DeviceSelection",
            "Device '{}' ({:?}) scored {}",
            candidate.name,
            candidate.device_type,
            score
        );
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((i, score));
        }
    }

    match best {
        Some((index, _)) => Ok(index),
        None => {
            let reasons: Vec<String> = candidates
                .iter()
                .map(|c| format!("{}: {}", c.name, c.unmet_requirements().join(", ")))
                .collect();
            crate::engine_error!(
                "lumen::DeviceSelection",
                "No suitable GPU among {} candidate(s)",
                candidates.len()
            );
            Err(Error::NoSuitableDevice(if reasons.is_empty() {
                "no physical devices enumerated".to_string()
            } else {
                reasons.join("; ")
            }))
        }
    }
}

#[cfg(test)]
#[path = "device_selection_tests.rs"]
mod tests;

//! The scene-graph boundary: deferred pose publication.
//!
//! The stepper never touches scene entities directly. It marks poses
//! dirty through [`PoseSink`]; downstream consumers (rendering, sensors)
//! drain the collected updates at their own cadence.

use rig_types::{LinkId, Pose};

/// One published pose: a link and its new world-frame pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseUpdate {
    /// The link whose pose changed.
    pub link: LinkId,
    /// World-frame position and orientation.
    pub pose: Pose,
}

/// Receiver for per-step pose publication.
pub trait PoseSink {
    /// Mark one link's pose dirty.
    fn mark_dirty(&mut self, link: LinkId, pose: Pose);
}

/// A sink that collects updates for deferred application.
///
/// Re-marking a link before the queue is drained keeps only the latest
/// pose, so a consumer that falls behind sees one update per link.
#[derive(Debug, Default)]
pub struct DirtyPoseQueue {
    updates: Vec<PoseUpdate>,
}

impl DirtyPoseQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Whether no updates are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Take all pending updates, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<PoseUpdate> {
        std::mem::take(&mut self.updates)
    }

    /// Peek at the pending update for one link.
    #[must_use]
    pub fn pending(&self, link: LinkId) -> Option<&PoseUpdate> {
        self.updates.iter().find(|u| u.link == link)
    }
}

impl PoseSink for DirtyPoseQueue {
    fn mark_dirty(&mut self, link: LinkId, pose: Pose) {
        if let Some(existing) = self.updates.iter_mut().find(|u| u.link == link) {
            existing.pose = pose;
        } else {
            self.updates.push(PoseUpdate { link, pose });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn remark_keeps_latest_pose() {
        let mut queue = DirtyPoseQueue::new();
        let link = LinkId::new(1);
        queue.mark_dirty(link, Pose::from_position(Point3::new(1.0, 0.0, 0.0)));
        queue.mark_dirty(link, Pose::from_position(Point3::new(2.0, 0.0, 0.0)));

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending(link).unwrap().pose.position.x, 2.0);

        let drained = queue.drain();
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());
    }
}

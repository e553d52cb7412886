//! Mute groups: exclusive playback, shared volume and mute.

use crate::{Error, Result};
use std::sync::Arc;
use stripline_core::{AtomicFlag, AtomicFloat, AtomicU32, Ordering};

/// Strips addressable by a group bitmask.
pub const MAX_GROUP_STRIPS: usize = 32;

#[derive(Debug)]
struct StripGroup {
    members: AtomicU32,
    volume: AtomicFloat,
    muted: AtomicFlag,
}

/// Group table shared by the control and audio contexts.
///
/// A strip belongs to at most one group. Triggering a member stops the other
/// members; group volume and mute scale every member at mix time.
#[derive(Debug, Clone)]
pub struct MuteGroups {
    groups: Arc<Vec<StripGroup>>,
}

impl MuteGroups {
    pub fn new(num_groups: usize) -> Self {
        let groups = (0..num_groups)
            .map(|_| StripGroup {
                members: AtomicU32::new(0),
                volume: AtomicFloat::new(1.0),
                muted: AtomicFlag::new(false),
            })
            .collect();
        Self {
            groups: Arc::new(groups),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn group(&self, group: usize) -> Result<&StripGroup> {
        self.groups.get(group).ok_or(Error::InvalidGroup {
            index: group,
            count: self.groups.len(),
        })
    }

    /// Move `strip` into `group`, or out of every group with `None`.
    pub fn assign(&self, strip: usize, group: Option<usize>) -> Result<()> {
        if strip >= MAX_GROUP_STRIPS {
            return Err(Error::InvalidStrip {
                index: strip,
                count: MAX_GROUP_STRIPS,
            });
        }
        if let Some(g) = group {
            self.group(g)?;
        }
        let bit = 1u32 << strip;
        for g in self.groups.iter() {
            g.members.fetch_and(!bit, Ordering::AcqRel);
        }
        if let Some(g) = group {
            self.groups[g].members.fetch_or(bit, Ordering::AcqRel);
        }
        Ok(())
    }

    pub fn group_of(&self, strip: usize) -> Option<usize> {
        if strip >= MAX_GROUP_STRIPS {
            return None;
        }
        let bit = 1u32 << strip;
        self.groups
            .iter()
            .position(|g| g.members.load(Ordering::Acquire) & bit != 0)
    }

    /// Member bitmask of `group` (bit `i` = strip `i`).
    pub fn members(&self, group: usize) -> u32 {
        self.groups
            .get(group)
            .map_or(0, |g| g.members.load(Ordering::Acquire))
    }

    /// Other strips sharing a group with `strip`.
    pub fn others_in_group(&self, strip: usize) -> impl Iterator<Item = usize> {
        let mask = self
            .group_of(strip)
            .map_or(0, |g| self.members(g) & !(1u32 << strip));
        (0..MAX_GROUP_STRIPS).filter(move |i| mask & (1u32 << i) != 0)
    }

    /// Range: 0 to 2.
    pub fn set_volume(&self, group: usize, volume: f32) -> Result<()> {
        self.group(group)?.volume.set_clamped(volume, 0.0, 2.0);
        Ok(())
    }

    pub fn volume(&self, group: usize) -> f32 {
        self.groups.get(group).map_or(1.0, |g| g.volume.get())
    }

    pub fn set_muted(&self, group: usize, muted: bool) -> Result<()> {
        self.group(group)?.muted.set(muted);
        Ok(())
    }

    pub fn is_muted(&self, group: usize) -> bool {
        self.groups.get(group).is_some_and(|g| g.muted.get())
    }

    /// Mix gain for `strip`: 1 outside any group, 0 when its group is muted.
    #[inline]
    pub fn gain_for(&self, strip: usize) -> f32 {
        match self.group_of(strip) {
            Some(g) if self.is_muted(g) => 0.0,
            Some(g) => self.volume(g),
            None => 1.0,
        }
    }
}

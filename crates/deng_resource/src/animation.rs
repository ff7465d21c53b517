//! Texture animation groups
//!
//! A group is a passive, ordered table of frames. [`Animator`] walks a group
//! tic by tic; the group itself never changes while animating.

use deng_core::Id;
use rand::Rng;

use crate::error::{ResourceError, ResourceResult};

/// Animation group flags
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct AnimGroupFlags(u32);

impl AnimGroupFlags {
    pub const NONE: Self = Self(0);
    /// Blend between consecutive frames
    pub const SMOOTH: Self = Self(1 << 0);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

/// One frame of an animation group
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnimationFrame {
    /// Texture manifest shown during the frame
    pub texture: Id,
    /// Base duration in tics
    pub tics: u16,
    /// Upper bound of the random extra duration
    pub random_tics: u16,
}

/// Ordered frames of one animation
#[derive(Clone, Debug)]
pub struct AnimationGroup {
    id: u32,
    flags: AnimGroupFlags,
    frames: Vec<AnimationFrame>,
}

impl AnimationGroup {
    /// 1-based group id
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn flags(&self) -> AnimGroupFlags {
        self.flags
    }

    pub fn is_smooth(&self) -> bool {
        self.flags.contains(AnimGroupFlags::SMOOTH)
    }

    /// Append a frame
    pub fn new_frame(&mut self, texture: Id, tics: u16, random_tics: u16) -> &AnimationFrame {
        self.frames.push(AnimationFrame {
            texture,
            tics,
            random_tics,
        });
        &self.frames[self.frames.len() - 1]
    }

    /// Remove every frame
    pub fn clear_all_frames(&mut self) {
        self.frames.clear();
    }

    pub fn has_frame_for(&self, texture: Id) -> bool {
        self.frames.iter().any(|frame| frame.texture == texture)
    }

    pub fn frames(&self) -> &[AnimationFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

/// Registry of animation groups, addressed by 1-based id
#[derive(Debug, Default)]
pub struct AnimationGroups {
    groups: Vec<AnimationGroup>,
}

impl AnimationGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty group and return its id
    pub fn create(&mut self, flags: AnimGroupFlags) -> u32 {
        let id = self.groups.len() as u32 + 1;
        self.groups.push(AnimationGroup {
            id,
            flags,
            frames: Vec::new(),
        });
        id
    }

    pub fn get(&self, id: u32) -> ResourceResult<&AnimationGroup> {
        (id as usize)
            .checked_sub(1)
            .and_then(|index| self.groups.get(index))
            .ok_or(ResourceError::UnknownAnimationGroup(id))
    }

    pub fn get_mut(&mut self, id: u32) -> ResourceResult<&mut AnimationGroup> {
        (id as usize)
            .checked_sub(1)
            .and_then(|index| self.groups.get_mut(index))
            .ok_or(ResourceError::UnknownAnimationGroup(id))
    }

    /// Check if any group animates `texture`
    pub fn has_frame_for(&self, texture: Id) -> bool {
        self.groups.iter().any(|group| group.has_frame_for(texture))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

/// Playback position within an animation group
#[derive(Clone, Debug)]
pub struct Animator {
    group: u32,
    frame: usize,
    elapsed: u32,
    duration: u32,
}

impl Animator {
    /// Start at the first frame of `group`
    pub fn new<R: Rng + ?Sized>(group: &AnimationGroup, rng: &mut R) -> Self {
        let mut animator = Self {
            group: group.id(),
            frame: 0,
            elapsed: 0,
            duration: 1,
        };
        animator.duration = animator.roll_duration(group, rng);
        animator
    }

    /// Id of the group being played
    pub fn group(&self) -> u32 {
        self.group
    }

    /// Index of the current frame
    pub fn frame_index(&self) -> usize {
        self.frame
    }

    /// Advance one tic. Returns true when the current frame changed.
    pub fn tick<R: Rng + ?Sized>(&mut self, group: &AnimationGroup, rng: &mut R) -> bool {
        if group.frame_count() < 2 {
            return false;
        }
        self.elapsed += 1;
        if self.elapsed < self.duration {
            return false;
        }
        self.frame = (self.frame + 1) % group.frame_count();
        self.elapsed = 0;
        self.duration = self.roll_duration(group, rng);
        true
    }

    /// Texture manifest of the current frame
    pub fn current(&self, group: &AnimationGroup) -> Option<Id> {
        group.frames().get(self.frame).map(|frame| frame.texture)
    }

    /// Texture manifest of the frame after the current one
    pub fn next(&self, group: &AnimationGroup) -> Option<Id> {
        let count = group.frame_count();
        (count > 0).then(|| group.frames()[(self.frame + 1) % count].texture)
    }

    /// How far the current frame has progressed toward the next, in
    /// `0.0..1.0`. Only smooth groups blend.
    pub fn blend(&self, group: &AnimationGroup) -> Option<f32> {
        group
            .is_smooth()
            .then(|| self.elapsed as f32 / self.duration as f32)
    }

    fn roll_duration<R: Rng + ?Sized>(&self, group: &AnimationGroup, rng: &mut R) -> u32 {
        let Some(frame) = group.frames().get(self.frame) else {
            return 1;
        };
        let jitter = if frame.random_tics > 0 {
            rng.gen_range(0..=u32::from(frame.random_tics))
        } else {
            0
        };
        // A zero-length frame still shows for one tic.
        (u32::from(frame.tics) + jitter).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn group(flags: AnimGroupFlags) -> (AnimationGroups, u32) {
        let mut groups = AnimationGroups::new();
        let id = groups.create(flags);
        let g = groups.get_mut(id).unwrap();
        g.new_frame(Id::new(10), 2, 0);
        g.new_frame(Id::new(11), 3, 0);
        (groups, id)
    }

    #[test]
    fn test_ids_are_one_based() {
        let (groups, id) = group(AnimGroupFlags::NONE);
        assert_eq!(id, 1);
        assert!(matches!(groups.get(0), Err(ResourceError::UnknownAnimationGroup(0))));
        assert!(matches!(groups.get(2), Err(ResourceError::UnknownAnimationGroup(2))));
        assert!(groups.has_frame_for(Id::new(11)));
        assert!(!groups.has_frame_for(Id::new(12)));
    }

    #[test]
    fn test_clear_all_frames() {
        let (mut groups, id) = group(AnimGroupFlags::NONE);
        groups.get_mut(id).unwrap().clear_all_frames();
        assert_eq!(groups.get(id).unwrap().frame_count(), 0);
        assert!(!groups.has_frame_for(Id::new(10)));
    }

    #[test]
    fn test_animator_steps_through_frames() {
        let (groups, id) = group(AnimGroupFlags::NONE);
        let g = groups.get(id).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut anim = Animator::new(g, &mut rng);

        assert_eq!(anim.current(g), Some(Id::new(10)));
        assert!(!anim.tick(g, &mut rng));
        assert!(anim.tick(g, &mut rng));
        assert_eq!(anim.current(g), Some(Id::new(11)));

        for _ in 0..2 {
            assert!(!anim.tick(g, &mut rng));
        }
        assert!(anim.tick(g, &mut rng));
        assert_eq!(anim.current(g), Some(Id::new(10)));
        assert_eq!(anim.blend(g), None);
    }

    #[test]
    fn test_random_tics_stay_in_range() {
        let mut groups = AnimationGroups::new();
        let id = groups.create(AnimGroupFlags::NONE);
        let g = groups.get_mut(id).unwrap();
        g.new_frame(Id::new(1), 4, 3);
        g.new_frame(Id::new(2), 4, 3);
        let g = groups.get(id).unwrap();

        let mut rng = StdRng::seed_from_u64(99);
        let mut anim = Animator::new(g, &mut rng);
        for _ in 0..20 {
            let mut tics = 1;
            while !anim.tick(g, &mut rng) {
                tics += 1;
            }
            assert!((4..=7).contains(&tics), "frame lasted {} tics", tics);
        }
    }

    #[test]
    fn test_smooth_group_blends() {
        let (groups, id) = group(AnimGroupFlags::SMOOTH);
        let g = groups.get(id).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mut anim = Animator::new(g, &mut rng);

        assert_eq!(anim.blend(g), Some(0.0));
        anim.tick(g, &mut rng);
        assert_eq!(anim.blend(g), Some(0.5));
        assert_eq!(anim.next(g), Some(Id::new(11)));
    }
}

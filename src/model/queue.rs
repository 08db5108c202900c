//! Play queue with shuffle/repeat index policy

use rand::Rng;
use rand::seq::SliceRandom;

use super::track::Track;
use super::types::RepeatMode;

/// Outcome of asking the queue for the next track
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Play(usize),
    /// Ran past the end with repeat off
    Stop,
}

/// Ordered tracks plus the cursor of the selected one.
///
/// `index` is `None` when nothing in the queue is selected, otherwise it is
/// always `< tracks.len()`.
#[derive(Clone, Debug, Default)]
pub struct PlayQueue {
    tracks: Vec<Track>,
    index: Option<usize>,
}

impl PlayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.index
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn position_of(&self, track_id: &str) -> Option<usize> {
        self.tracks.iter().position(|t| t.id == track_id)
    }

    /// Replace the whole queue with a new browsing context.
    ///
    /// The context is permuted first when `shuffle` is set. The cursor lands on
    /// `target`, or on the first slot if `target` is not part of the context.
    /// An empty context behaves like selecting `target` on an empty queue.
    pub fn replace<R: Rng>(
        &mut self,
        mut context: Vec<Track>,
        target: &Track,
        shuffle: bool,
        rng: &mut R,
    ) -> usize {
        if context.is_empty() {
            self.clear();
            return self.select(target);
        }

        if shuffle {
            context.shuffle(rng);
        }
        self.tracks = context;

        let index = match self.position_of(&target.id) {
            Some(index) => index,
            None => {
                tracing::warn!(track_id = %target.id, "Selected track not in supplied context, defaulting to first slot");
                0
            }
        };
        self.index = Some(index);
        index
    }

    /// Select a track without a new context: find it, or append it.
    pub fn select(&mut self, track: &Track) -> usize {
        let index = match self.position_of(&track.id) {
            Some(index) => index,
            None => {
                self.tracks.push(track.clone());
                self.tracks.len() - 1
            }
        };
        self.index = Some(index);
        index
    }

    /// Point the cursor at `track_id` if present, otherwise deselect.
    pub fn point_at(&mut self, track_id: &str) -> Option<usize> {
        self.index = self.position_of(track_id);
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.index = Some(index);
        }
    }

    /// Forward step per repeat/shuffle policy. `None` for an empty queue.
    ///
    /// Shuffle draws uniformly from the whole queue and may pick the current
    /// track again.
    pub fn next_step<R: Rng>(
        &self,
        repeat: RepeatMode,
        shuffling: bool,
        rng: &mut R,
    ) -> Option<Step> {
        if self.tracks.is_empty() {
            return None;
        }

        let candidate = if repeat == RepeatMode::One {
            self.index.unwrap_or(0)
        } else if shuffling {
            rng.gen_range(0..self.tracks.len())
        } else {
            self.index.map_or(0, |i| i + 1)
        };

        if candidate < self.tracks.len() {
            Some(Step::Play(candidate))
        } else if repeat == RepeatMode::All {
            Some(Step::Play(0))
        } else {
            Some(Step::Stop)
        }
    }

    /// Backward step. Always wraps; shuffle draws a random index.
    pub fn previous_index<R: Rng>(&self, shuffling: bool, rng: &mut R) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        if shuffling {
            return Some(rng.gen_range(0..len));
        }

        Some(match self.index {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        })
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn track(id: &str) -> Track {
        Track::new(id, format!("Title {id}"), "Artist").with_audio_url(format!("file:///{id}.mp3"))
    }

    fn queue_of(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| track(id)).collect()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn replace_points_at_target() {
        let mut queue = PlayQueue::new();
        let index = queue.replace(queue_of(&["t1", "t2", "t3"]), &track("t2"), false, &mut rng());

        assert_eq!(index, 1);
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn replace_defaults_to_first_slot_when_target_missing() {
        let mut queue = PlayQueue::new();
        let index = queue.replace(queue_of(&["t1", "t2"]), &track("zz"), false, &mut rng());

        assert_eq!(index, 0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn replace_with_empty_context_makes_singleton() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2"]), &track("t1"), false, &mut rng());

        let index = queue.replace(Vec::new(), &track("t9"), false, &mut rng());

        assert_eq!(index, 0);
        assert_eq!(queue.tracks(), &[track("t9")]);
    }

    #[test]
    fn shuffled_replace_keeps_every_track_and_tracks_target() {
        let ids: Vec<String> = (0..20).map(|i| format!("t{i}")).collect();
        let context: Vec<Track> = ids.iter().map(|id| track(id)).collect();
        let mut queue = PlayQueue::new();

        let index = queue.replace(context.clone(), &track("t5"), true, &mut rng());

        assert_eq!(queue.tracks()[index].id, "t5");
        let mut shuffled: Vec<&str> = queue.tracks().iter().map(|t| t.id.as_str()).collect();
        shuffled.sort();
        let mut original: Vec<&str> = ids.iter().map(String::as_str).collect();
        original.sort();
        assert_eq!(shuffled, original);
        assert_ne!(queue.tracks(), context.as_slice());
    }

    #[test]
    fn select_appends_unknown_track() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2", "t3"]), &track("t1"), false, &mut rng());

        assert_eq!(queue.select(&track("t4")), 3);
        assert_eq!(queue.len(), 4);
        assert_eq!(queue.select(&track("t2")), 1);
        assert_eq!(queue.len(), 4);
    }

    #[test]
    fn select_on_empty_queue_creates_singleton() {
        let mut queue = PlayQueue::new();
        assert_eq!(queue.select(&track("only")), 0);
        assert_eq!(queue.tracks(), &[track("only")]);
    }

    #[test]
    fn next_step_follows_repeat_policy() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2", "t3"]), &track("t3"), false, &mut rng());

        assert_eq!(queue.next_step(RepeatMode::Off, false, &mut rng()), Some(Step::Stop));
        assert_eq!(queue.next_step(RepeatMode::All, false, &mut rng()), Some(Step::Play(0)));
        assert_eq!(queue.next_step(RepeatMode::One, false, &mut rng()), Some(Step::Play(2)));

        queue.set_index(0);
        assert_eq!(queue.next_step(RepeatMode::Off, false, &mut rng()), Some(Step::Play(1)));
    }

    #[test]
    fn repeat_one_wins_over_shuffle() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2", "t3", "t4"]), &track("t2"), false, &mut rng());

        for _ in 0..10 {
            assert_eq!(queue.next_step(RepeatMode::One, true, &mut rng()), Some(Step::Play(1)));
        }
    }

    #[test]
    fn shuffled_next_stays_in_bounds() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2", "t3"]), &track("t1"), false, &mut rng());
        let mut rng = rng();

        for _ in 0..100 {
            match queue.next_step(RepeatMode::Off, true, &mut rng) {
                Some(Step::Play(i)) => assert!(i < 3),
                other => panic!("unexpected step {other:?}"),
            }
        }
    }

    #[test]
    fn previous_always_wraps() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2", "t3"]), &track("t1"), false, &mut rng());

        assert_eq!(queue.previous_index(false, &mut rng()), Some(2));
        queue.set_index(2);
        assert_eq!(queue.previous_index(false, &mut rng()), Some(1));
    }

    #[test]
    fn empty_queue_has_no_steps() {
        let queue = PlayQueue::new();
        assert_eq!(queue.next_step(RepeatMode::All, false, &mut rng()), None);
        assert_eq!(queue.previous_index(true, &mut rng()), None);
    }

    #[test]
    fn point_at_deselects_unknown_track() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1", "t2"]), &track("t2"), false, &mut rng());

        assert_eq!(queue.point_at("nope"), None);
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.point_at("t1"), Some(0));
    }

    #[test]
    fn set_index_ignores_out_of_range() {
        let mut queue = PlayQueue::new();
        queue.replace(queue_of(&["t1"]), &track("t1"), false, &mut rng());
        queue.set_index(5);
        assert_eq!(queue.current_index(), Some(0));
    }
}

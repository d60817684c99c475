//! Layout providers
//!
//! A provider turns a free-text prompt into the paragraph the bricks are
//! built from. The network-backed provider lives in the host; this module
//! defines the seam and an offline provider of canned paragraphs.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::BackendError;

/// Source of paragraphs for new runs
pub trait LayoutProvider {
    /// Produce a paragraph for `prompt`. Any error sends the session back to idle.
    fn request_layout(&mut self, prompt: &str) -> Result<String, BackendError>;
}

impl<F> LayoutProvider for F
where
    F: FnMut(&str) -> Result<String, BackendError>,
{
    fn request_layout(&mut self, prompt: &str) -> Result<String, BackendError> {
        self(prompt)
    }
}

/// Built-in paragraphs for offline play
pub const CANNED_PARAGRAPHS: &[&str] = &[
    "Thrilled to share that after a quarter of relentless alignment meetings I have been \
     promoted from Intern to Senior Intern. I could not have reached this summit without my \
     stapler, my standing desk and an unshakeable growth mindset. Remember: every spreadsheet \
     is a story waiting to scale. #Blessed #LevelUp",
    "Humbled to announce that my midnight refactor shaved four nanoseconds off our login page, \
     unlocking visionary synergy across seven verticals. I wrote zero tests because my code \
     simply refuses to fail. Innovation never sleeps; it just force pushes to main. \
     #TenXEngineer #ShipIt",
    "Honored to have containerized the office coffee machine, orchestrated a flawless rollout \
     of oat milk and achieved five nines of caffeine availability before the first standup. \
     True leaders autoscale their enthusiasm and never let a pod restart their passion. \
     #CloudNative #BrewOps",
    "Beyond excited to celebrate my hundredth consecutive pull request approved without a \
     single comment. Colleagues say my diffs read like poetry; I say they read like velocity \
     distilled into semicolons. Dropping knowledge one commit at a time. #MergeMaestro",
    "Just facilitated a record breaking six minute retrospective that birthed our proprietary \
     Sprint Within A Sprint framework. We did not move the needle, we refactored it into a \
     reusable component and filed three patents before lunch. Stand up, sync up, scale up. \
     #AgileArtisan",
    "Proud to report one hundred and twenty percent test coverage after unit testing my unit \
     tests and snapshotting the snapshots. Bugs now open tickets against themselves, attach \
     their own reproduction steps and politely close as duplicates. Quality is a lifestyle. \
     #ZeroDefects #TestDriven",
    "Reached a milestone: I turned three caffeinated juniors into purpose driven Solution \
     Architects with my proprietary Print Statement to Boardroom masterclass, delivered in a \
     single elevator ride. Mentorship is just code review for the soul. #PayItForward",
    "Electrified to share that one prompt engineering session turned a napkin sketch and a \
     whiteboard full of arrows into a production roadmap, a pitch deck and a mission statement \
     before my oat latte cooled. The future is multimodal and so am I. #AIFirst #Disrupt",
    "Thrilled to have closed the loop between my infrastructure plan and my personal growth \
     plan while misting the office ferns for mindfulness. In under two minutes I provisioned \
     forty servers and one gratitude journal. Scale your stack, scale yourself. #InfraAsCalm",
    "Honored to upgrade my headline from Bug Fixer to Narrative Driven Software Visionary and \
     Chief Refactor Evangelist. When your commit messages read like epic sagas and your release \
     notes win poetry slams, the backlog simply writes itself. #StoryFirst #ThoughtLeader",
];

/// Offline provider that ignores the prompt and picks a canned paragraph
#[derive(Debug, Clone)]
pub struct CannedParagraphs {
    paragraphs: Vec<String>,
    rng: Pcg32,
}

impl CannedParagraphs {
    /// Provider over the built-in paragraphs
    pub fn new(seed: u64) -> Self {
        Self::with_paragraphs(CANNED_PARAGRAPHS.iter().map(|p| p.to_string()).collect(), seed)
    }

    /// Provider over a custom set of paragraphs
    pub fn with_paragraphs(paragraphs: Vec<String>, seed: u64) -> Self {
        Self {
            paragraphs,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}

impl LayoutProvider for CannedParagraphs {
    fn request_layout(&mut self, _prompt: &str) -> Result<String, BackendError> {
        if self.paragraphs.is_empty() {
            return Err(BackendError::Malformed("no canned paragraphs".into()));
        }
        let index = self.rng.random_range(0..self.paragraphs.len());
        Ok(self.paragraphs[index].clone())
    }
}

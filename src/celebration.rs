use rand::seq::SliceRandom;
use rand::Rng;
use std::time::{Duration, Instant};

use crate::stats::{Metric, PersonalBest};

const SPARKS: [char; 6] = ['*', '+', '·', '✦', '✧', '•'];
const PALETTE_SIZE: usize = 7;
const GRAVITY: f64 = 12.0;

#[derive(Debug, Clone)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
    /// Letters of the banner fly to a fixed spot and stay there
    pub target: Option<(f64, f64)>,
}

impl Particle {
    fn spark<R: Rng + ?Sized>(x: f64, y: f64, rng: &mut R) -> Self {
        Self {
            x,
            y,
            vel_x: rng.gen_range(-3.0..3.0),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *SPARKS.choose(rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..PALETTE_SIZE),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
            target: None,
        }
    }

    fn letter(from: (f64, f64), to: (f64, f64), symbol: char, color_index: usize) -> Self {
        Self {
            x: from.0,
            y: from.1,
            vel_x: to.0 - from.0,
            vel_y: to.1 - from.1,
            symbol,
            color_index,
            age: 0.0,
            max_age: 3.5,
            target: Some(to),
        }
    }

    pub fn is_letter(&self) -> bool {
        self.target.is_some()
    }

    fn update(&mut self, dt: f64) -> bool {
        match self.target {
            Some((tx, ty)) => {
                let distance = ((tx - self.x).powi(2) + (ty - self.y).powi(2)).sqrt();
                if distance > 1.0 {
                    self.x += self.vel_x * dt;
                    self.y += self.vel_y * dt;
                    self.vel_x *= 0.95;
                    self.vel_y *= 0.95;
                } else {
                    self.x = tx;
                    self.y = ty;
                    self.vel_x = 0.0;
                    self.vel_y = 0.0;
                }
            }
            None => {
                self.x += self.vel_x * dt;
                self.y += self.vel_y * dt;
                self.vel_y += GRAVITY * dt;
            }
        }

        self.age += dt;
        self.age < self.max_age
    }
}

/// Banner text for a batch of personal bests, the widest metric first
pub fn banner(bests: &[PersonalBest]) -> Option<String> {
    let best = bests
        .iter()
        .max_by_key(|pb| match pb.metric {
            Metric::Single => 0,
            Metric::Ao5 => 1,
            Metric::Ao12 => 2,
        })?;
    let label = match best.metric {
        Metric::Single => "PB".to_string(),
        metric => format!("PB {}", metric.to_string().to_uppercase()),
    };
    Some(format!("{label} {}", best.formatted))
}

/// Particle burst shown over the timer after a personal best
#[derive(Debug)]
pub struct Celebration {
    pub particles: Vec<Particle>,
    pub text: String,
    started_at: Instant,
    duration: Duration,
    width: f64,
    height: f64,
}

impl Default for Celebration {
    fn default() -> Self {
        Self {
            particles: Vec::new(),
            text: String::new(),
            started_at: Instant::now(),
            duration: Duration::from_secs(3),
            width: 80.0,
            height: 24.0,
        }
    }
}

impl Celebration {
    pub fn is_active(&self) -> bool {
        !self.particles.is_empty()
    }

    /// Start a burst for `bests`. Nothing happens when the list is empty.
    pub fn start(&mut self, bests: &[PersonalBest], width: u16, height: u16) {
        let Some(text) = banner(bests) else {
            return;
        };
        self.start_with(text, width, height, &mut rand::thread_rng());
    }

    fn start_with<R: Rng + ?Sized>(&mut self, text: String, width: u16, height: u16, rng: &mut R) {
        self.particles.clear();
        self.started_at = Instant::now();
        self.width = width as f64;
        self.height = height as f64;

        let center_x = self.width / 2.0;
        let center_y = self.height / 2.0;

        let spacing = 2.0;
        let text_width = (text.chars().count().saturating_sub(1)) as f64 * spacing;
        let left = center_x - text_width / 2.0;
        for (i, ch) in text.chars().enumerate().filter(|(_, ch)| *ch != ' ') {
            let from = (
                center_x + rng.gen_range(-10.0..10.0),
                center_y + rng.gen_range(-5.0..5.0),
            );
            let to = (left + i as f64 * spacing, center_y - 2.0);
            self.particles
                .push(Particle::letter(from, to, ch, rng.gen_range(0..PALETTE_SIZE)));
        }

        for _ in 0..20 {
            let x = center_x + rng.gen_range(-15.0..15.0);
            let y = center_y + rng.gen_range(-6.0..6.0);
            self.particles.push(Particle::spark(x, y, rng));
        }
        self.text = text;
    }

    /// Advance one animation tick.
    pub fn update(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.started_at.elapsed() >= self.duration {
            self.particles.clear();
            return;
        }

        let margin = 5.0;
        let (width, height) = (self.width, self.height);
        self.particles.retain_mut(|particle| {
            let alive = particle.update(0.1);
            let off_screen = !particle.is_letter()
                && (particle.y > height + margin
                    || particle.x < -margin
                    || particle.x > width + margin);
            alive && !off_screen
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pb(metric: Metric, formatted: &str) -> PersonalBest {
        PersonalBest {
            metric,
            value: 0.0,
            formatted: formatted.to_string(),
            previous: None,
        }
    }

    #[test]
    fn test_banner_prefers_longest_average() {
        assert_eq!(banner(&[]), None);
        assert_eq!(banner(&[pb(Metric::Single, "9.87")]).as_deref(), Some("PB 9.87"));
        assert_eq!(
            banner(&[pb(Metric::Single, "9.87"), pb(Metric::Ao5, "11.20")]).as_deref(),
            Some("PB AO5 11.20")
        );
    }

    #[test]
    fn test_start_without_bests_stays_idle() {
        let mut celebration = Celebration::default();
        celebration.start(&[], 80, 24);
        assert!(!celebration.is_active());
    }

    #[test]
    fn test_burst_has_letters_and_sparks() {
        let mut celebration = Celebration::default();
        let mut rng = StdRng::seed_from_u64(3);
        celebration.start_with("PB 9.87".to_string(), 80, 24, &mut rng);

        assert!(celebration.is_active());
        let letters: String = celebration
            .particles
            .iter()
            .filter(|p| p.is_letter())
            .map(|p| p.symbol)
            .collect();
        assert_eq!(letters, "PB9.87");
        assert!(celebration.particles.iter().any(|p| !p.is_letter()));
    }

    #[test]
    fn test_letters_settle_on_target() {
        let mut letter = Particle::letter((0.0, 0.0), (10.0, 5.0), 'A', 0);
        for _ in 0..30 {
            letter.update(0.1);
        }
        let (tx, ty) = letter.target.unwrap();
        let distance = ((tx - letter.x).powi(2) + (ty - letter.y).powi(2)).sqrt();
        assert!(distance < 5.0);
    }

    #[test]
    fn test_sparks_fall_and_leave_the_screen() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut spark = Particle::spark(10.0, 10.0, &mut rng);
        let vel_y = spark.vel_y;
        assert!(spark.update(0.1));
        assert!(spark.vel_y > vel_y);

        let mut celebration = Celebration::default();
        celebration.start_with("PB".to_string(), 20, 10, &mut rng);
        celebration.particles.push(Particle::spark(100.0, 100.0, &mut rng));
        celebration.update();
        assert!(celebration
            .particles
            .iter()
            .all(|p| p.is_letter() || p.x <= 25.0));
    }
}

//! Classification of raw switch attribute codes into gestures
//!
//! Wireless switches of the `lumi.sensor_switch` family do not report
//! gestures directly: the hub receives a stream of small integer codes on
//! the `genOnOff` cluster and has to work out what the user actually did.
//! [`GestureStream`] turns such a code stream into [`Gesture`]s, using a
//! hold-confirmation timer to tell a held key from a short press and a
//! cooldown timer to re-arm classification after each emitted gesture.

use async_timer::new_timer;
use async_timer::timer::Platform as Timer;
use futures::{Stream, StreamExt};
use light_ranged_integers::RangedU8;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

/// How long a key must stay down before it counts as held, unless a device
/// setting overrides it
pub const DEFAULT_HOLD_THRESHOLD: Duration = Duration::from_millis(1000);

/// How long after an emitted gesture identical codes are suppressed
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

/// Code reported when a key press begins (the hold cycle starts)
const HOLD_BEGIN: u8 = 0;
/// Code reported when a key is released after being held
const HOLD_RELEASE: u8 = 17;

/// A classified interaction with a switch key
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Gesture {
    /// The key was pressed between one and four times, as counted by the
    /// hardware itself
    Pressed(RangedU8<1, 4>),
    /// The key has been held down past the hold threshold
    Held,
    /// The key was released after being held
    Released,
}

impl Gesture {
    /// The scene label used by trigger subsystems, eg: "Key Pressed 2 times"
    pub fn scene_label(&self) -> &'static str {
        match self {
            Self::Held => "Key Held Down",
            Self::Released => "Key Released",
            Self::Pressed(count) => {
                if *count == 1 {
                    "Key Pressed 1 time"
                } else if *count == 2 {
                    "Key Pressed 2 times"
                } else if *count == 3 {
                    "Key Pressed 3 times"
                } else {
                    "Key Pressed 4 times"
                }
            }
        }
    }

    /// The literal gesture for a raw code, [None] for codes the hardware is
    /// not documented to send. Code 0 is not a gesture by itself (it opens a
    /// hold cycle) and also maps to [None]
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => Self::Pressed(RangedU8::new(1)),
            2 => Self::Pressed(RangedU8::new(2)),
            3 => Self::Pressed(RangedU8::new(3)),
            4 => Self::Pressed(RangedU8::new(4)),
            HOLD_RELEASE => Self::Released,
            _ => return None,
        })
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scene_label())
    }
}

/// A gesture together with the device that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct GestureEvent {
    /// Name of the owning device
    pub device: String,
    /// The classified gesture
    pub gesture: Gesture,
}

impl fmt::Display for GestureEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.device, self.gesture)
    }
}

/// Tunables for gesture classification
///
/// The hold threshold is the per-device setting surfaced by drivers; the
/// cooldown keeps its default everywhere outside of tests
#[derive(Debug, Clone, Copy)]
pub struct GestureConfig {
    /// Time a key must stay down before "Key Held Down" is emitted
    pub hold_threshold: Duration,
    /// Window after an emitted gesture during which repeated identical codes
    /// are ignored
    pub cooldown: Duration,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            hold_threshold: DEFAULT_HOLD_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
        }
    }
}

/// Classifies a stream of raw attribute codes into [`Gesture`]s
///
/// All three event sources (incoming codes, the hold-confirmation timer and
/// the reset timer) are serialized through [`poll_next`](Stream::poll_next),
/// so state is never mutated concurrently. Every instance owns its state;
/// two devices must never share one stream.
pub struct GestureStream<S: Stream<Item = u8> + Unpin> {
    codes: S,
    config: GestureConfig,
    /// last code that produced a transition, cleared by the reset timer
    last_code: Option<u8>,
    /// true once the hold-confirmation timer has fired for the current cycle
    held: bool,
    hold_timer: Option<Pin<Box<Timer>>>,
    reset_timer: Option<Pin<Box<Timer>>>,
}

impl<S: Stream<Item = u8> + Unpin> GestureStream<S> {
    /// Wrap a raw code stream
    pub fn new(codes: S, config: GestureConfig) -> Self {
        Self {
            codes,
            config,
            last_code: None,
            held: false,
            hold_timer: None,
            reset_timer: None,
        }
    }

    /// Apply one raw code to the classifier state, returning the gesture to
    /// emit, if any. Timer arming replaces any previous instance of the same
    /// timer; dropping the old handle cancels it
    fn transition(&mut self, code: u8) -> Option<Gesture> {
        if !recognized(code) {
            return None;
        }
        if self.last_code == Some(code) {
            // duplicate report of an unchanged state within the cooldown
            return None;
        }
        self.last_code = Some(code);
        if code == HOLD_BEGIN {
            self.held = false;
            self.hold_timer = Some(Box::pin(new_timer(self.config.hold_threshold)));
            return None;
        }
        // any code supersedes a pending hold confirmation
        self.hold_timer = None;
        let gesture = if self.held && code == 1 {
            // after a held-and-released cycle the hardware reports a literal
            // "1"; resolve it as the release it actually is
            Gesture::Released
        } else {
            Gesture::from_code(code)?
        };
        self.reset_timer = Some(Box::pin(new_timer(self.config.cooldown)));
        Some(gesture)
    }
}

fn recognized(code: u8) -> bool {
    code == HOLD_BEGIN || Gesture::from_code(code).is_some()
}

impl<S: Stream<Item = u8> + Unpin> Stream for GestureStream<S> {
    type Item = Gesture;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // drain ready input first, a report always beats a pending timer
        loop {
            match this.codes.poll_next_unpin(cx) {
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Ready(Some(code)) => {
                    if let Some(gesture) = this.transition(code) {
                        return Poll::Ready(Some(gesture));
                    }
                }
                Poll::Pending => break,
            }
        }

        if let Some(timer) = this.hold_timer.as_mut() {
            if timer.as_mut().poll(cx).is_ready() {
                this.hold_timer = None;
                this.held = true;
                return Poll::Ready(Some(Gesture::Held));
            }
        }

        if let Some(timer) = this.reset_timer.as_mut() {
            if timer.as_mut().poll(cx).is_ready() {
                this.reset_timer = None;
                this.last_code = None;
            }
        }

        Poll::Pending
    }
}

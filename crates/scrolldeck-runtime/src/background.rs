#![forbid(unsafe_code)]

//! Persistent background layers.
//!
//! Every unique `(image, blur)` pair becomes exactly one layer, created at
//! initialization and never destroyed. Sections that share a pair share the
//! layer, each contributing its own transform keyframes. A navigation step
//! produces [`LayerCommand`]s; the stack keeps the bookkeeping (visibility,
//! z-order, target opacity) needed to compute the next step.
//!
//! # Invariants
//!
//! 1. `layers().len()` equals the number of distinct `(image, blur)` pairs.
//! 2. z-indices handed out by forward steps and occlusion fixes are strictly
//!    increasing.
//! 3. Forward steps never hide a layer.
//! 4. After a backward step the target layer is above every other visible
//!    layer.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Section without background | No commands for it; previous layers stay |
//! | Out-of-range section index | No commands |

use std::fmt;

use scrolldeck_core::content::{BackgroundSpec, Deck, KeyframePair};
use scrolldeck_core::logging::TARGET_BACKGROUND;

/// Index of a layer in [`BackgroundLayerStack::layers`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerId(pub usize);

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bg{}", self.0)
    }
}

/// Identity of a layer: image plus blur (bit pattern, so it can be hashed).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LayerKey {
    pub image: String,
    blur_bits: Option<u32>,
}

impl LayerKey {
    /// Key for a background spec; zero blur equals no blur.
    #[must_use]
    pub fn of(spec: &BackgroundSpec) -> Self {
        Self {
            image: spec.image.clone(),
            blur_bits: spec.effective_blur().map(f32::to_bits),
        }
    }

    /// Blur radius in px, if any.
    #[must_use]
    pub fn blur(&self) -> Option<f32> {
        self.blur_bits.map(f32::from_bits)
    }
}

/// One section's use of a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionKeyframes {
    pub section: usize,
    pub scale: KeyframePair,
    pub rotate: KeyframePair,
    pub opacity: KeyframePair,
}

/// A persistent background layer.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundLayer {
    pub id: LayerId,
    pub key: LayerKey,
    pub z_index: u32,
    /// Sections using this layer, in section order.
    pub sections: Vec<SectionKeyframes>,
    visible: bool,
    opacity: f32,
}

impl BackgroundLayer {
    /// Whether the layer is currently shown.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Opacity the layer was last driven to.
    #[must_use]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Keyframes contributed by `section`.
    #[must_use]
    pub fn keyframes(&self, section: usize) -> Option<&SectionKeyframes> {
        self.sections.iter().find(|k| k.section == section)
    }

    fn referenced_only_after(&self, section: usize) -> bool {
        self.sections.iter().all(|k| k.section > section)
    }
}

/// A change to apply to one layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LayerChange {
    /// Show instantly at the given values (initial state).
    Show {
        z_index: u32,
        opacity: f32,
        scale: f32,
        rotate: f32,
    },
    /// Fade in on top, animating the section's keyframes.
    FadeIn {
        z_index: u32,
        opacity: KeyframePair,
        scale: KeyframePair,
        rotate: KeyframePair,
    },
    /// Fade out completely.
    FadeOut { from: f32 },
    /// Animate opacity up to the pair's end value.
    RaiseOpacity { opacity: KeyframePair },
    /// Move above the other visible layers.
    Restack { z_index: u32 },
    /// Run a section's transform keyframes on an already visible layer.
    Transform {
        scale: KeyframePair,
        rotate: KeyframePair,
        opacity: KeyframePair,
    },
}

/// A change addressed to a layer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerCommand {
    pub layer: LayerId,
    pub change: LayerChange,
}

/// All background layers of a deck.
#[derive(Debug, Clone, Default)]
pub struct BackgroundLayerStack {
    layers: Vec<BackgroundLayer>,
    section_layer: Vec<Option<LayerId>>,
    next_z: u32,
}

impl BackgroundLayerStack {
    /// Build one layer per distinct `(image, blur)` pair, in order of first
    /// appearance.
    #[must_use]
    pub fn new(deck: &Deck) -> Self {
        let mut stack = Self::default();
        for (index, section) in deck.sections().iter().enumerate() {
            let Some(spec) = &section.meta().background else {
                stack.section_layer.push(None);
                continue;
            };
            let key = LayerKey::of(spec);
            let keyframes = SectionKeyframes {
                section: index,
                scale: spec.scale,
                rotate: spec.rotate,
                opacity: spec.opacity,
            };
            let id = match stack.layers.iter().position(|l| l.key == key) {
                Some(existing) => {
                    stack.layers[existing].sections.push(keyframes);
                    LayerId(existing)
                }
                None => {
                    let id = LayerId(stack.layers.len());
                    stack.layers.push(BackgroundLayer {
                        id,
                        key,
                        z_index: 0,
                        sections: vec![keyframes],
                        visible: false,
                        opacity: 0.0,
                    });
                    id
                }
            };
            stack.section_layer.push(Some(id));
        }
        tracing::debug!(
            target: TARGET_BACKGROUND,
            layers = stack.layers.len(),
            sections = stack.section_layer.len(),
            "background layers built"
        );
        stack
    }

    /// All layers.
    #[must_use]
    pub fn layers(&self) -> &[BackgroundLayer] {
        &self.layers
    }

    /// Number of layers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the deck has no backgrounds at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer used by `section`.
    #[must_use]
    pub fn layer_for(&self, section: usize) -> Option<&BackgroundLayer> {
        let id = self.section_layer.get(section).copied().flatten()?;
        self.layers.get(id.0)
    }

    /// Show the layer of section 0 at its end values.
    pub fn initial(&mut self) -> Vec<LayerCommand> {
        let Some((id, kf)) = self.resolve(0) else {
            return Vec::new();
        };
        let z_index = self.bump_z();
        let layer = &mut self.layers[id.0];
        layer.visible = true;
        layer.opacity = kf.opacity.to;
        layer.z_index = z_index;
        vec![LayerCommand {
            layer: id,
            change: LayerChange::Show {
                z_index,
                opacity: kf.opacity.to,
                scale: kf.scale.to,
                rotate: kf.rotate.to,
            },
        }]
    }

    /// Commands for navigating from section `from` to section `to`.
    pub fn transition(&mut self, from: usize, to: usize) -> Vec<LayerCommand> {
        if from == to {
            return Vec::new();
        }
        let origin = self.section_layer.get(from).copied().flatten();
        let target = self.resolve(to);

        let commands = match target {
            Some((id, kf)) if Some(id) == origin => vec![LayerCommand {
                layer: id,
                change: LayerChange::Transform {
                    scale: kf.scale,
                    rotate: kf.rotate,
                    opacity: kf.opacity,
                },
            }],
            _ if to > from => self.forward(target),
            _ => self.backward(to, target),
        };

        tracing::debug!(
            target: TARGET_BACKGROUND,
            from,
            to,
            commands = commands.len(),
            "background transition planned"
        );
        commands
    }

    fn forward(&mut self, target: Option<(LayerId, SectionKeyframes)>) -> Vec<LayerCommand> {
        let Some((id, kf)) = target else {
            return Vec::new();
        };
        let z_index = self.bump_z();
        let layer = &mut self.layers[id.0];
        layer.visible = true;
        layer.opacity = kf.opacity.to;
        layer.z_index = z_index;
        vec![LayerCommand {
            layer: id,
            change: LayerChange::FadeIn {
                z_index,
                opacity: kf.opacity,
                scale: kf.scale,
                rotate: kf.rotate,
            },
        }]
    }

    fn backward(
        &mut self,
        to: usize,
        target: Option<(LayerId, SectionKeyframes)>,
    ) -> Vec<LayerCommand> {
        let mut commands = Vec::new();
        let target_id = target.map(|(id, _)| id);

        for layer in &mut self.layers {
            if Some(layer.id) != target_id && layer.visible && layer.referenced_only_after(to) {
                commands.push(LayerCommand {
                    layer: layer.id,
                    change: LayerChange::FadeOut {
                        from: layer.opacity,
                    },
                });
                layer.visible = false;
                layer.opacity = 0.0;
            }
        }

        let Some((id, kf)) = target else {
            return commands;
        };

        let target_z = self.layers[id.0].z_index;
        let occluded = self
            .layers
            .iter()
            .any(|l| l.id != id && l.visible && l.z_index >= target_z);
        if occluded || !self.layers[id.0].visible {
            let z_index = self.bump_z();
            self.layers[id.0].z_index = z_index;
            commands.push(LayerCommand {
                layer: id,
                change: LayerChange::Restack { z_index },
            });
        }

        let layer = &mut self.layers[id.0];
        let wanted = kf.opacity.to;
        if !layer.visible || layer.opacity < wanted {
            // A hidden layer starts from its own keyframe, a visible one from where it is.
            let from = if layer.visible {
                layer.opacity
            } else {
                kf.opacity.from
            };
            commands.push(LayerCommand {
                layer: id,
                change: LayerChange::RaiseOpacity {
                    opacity: KeyframePair::new(from, wanted),
                },
            });
        }
        layer.visible = true;
        layer.opacity = wanted;

        commands.push(LayerCommand {
            layer: id,
            change: LayerChange::Transform {
                scale: kf.scale,
                rotate: kf.rotate,
                opacity: KeyframePair::constant(wanted),
            },
        });
        commands
    }

    fn resolve(&self, section: usize) -> Option<(LayerId, SectionKeyframes)> {
        let id = self.section_layer.get(section).copied().flatten()?;
        let kf = *self.layers.get(id.0)?.keyframes(section)?;
        Some((id, kf))
    }

    fn bump_z(&mut self) -> u32 {
        self.next_z += 1;
        self.next_z
    }
}

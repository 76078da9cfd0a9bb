#[cfg(feature = "parallel")]
use rayon::prelude::*;

use log::{debug, warn};

use crate::{
    collision::{
        broadphase::{BroadPhase, BruteForce, CandidatePair, Proxy, SweepAndPrune},
        contact::ContactPair,
        narrowphase,
    },
    config::WorldConfig,
    core::{body::Body, registry::BodyRegistry, shape::ShapeKind},
    dynamics::{
        behavior::{
            BehaviorTarget, CollisionDetectionConfig, ImpulseResponseConfig, SweepPruneConfig,
        },
        solver::ImpulseResolver,
    },
    error::ConfigError,
    utils::allocator::pair_mut,
};

const DETECTION: &str = "body-collision-detection";

/// Broad phase, narrow phase and contact response settings of a world.
///
/// Detection stays off until a collision-detection behavior is added;
/// without an impulse-response behavior contacts are only reported.
pub struct CollisionManager {
    detection: Option<BehaviorTarget>,
    resolver: Option<ImpulseResolver>,
    broadphase: Box<dyn BroadPhase>,
    parallel: bool,
}

impl Default for CollisionManager {
    fn default() -> Self {
        Self::new(false)
    }
}

impl CollisionManager {
    pub fn new(parallel: bool) -> Self {
        Self {
            detection: None,
            resolver: None,
            broadphase: Box::new(BruteForce),
            parallel,
        }
    }

    pub fn is_detecting(&self) -> bool {
        self.detection.is_some()
    }

    pub fn is_responding(&self) -> bool {
        self.resolver.is_some()
    }

    pub fn broadphase_name(&self) -> &'static str {
        self.broadphase.name()
    }

    /// Whether narrow-phase detection runs on the rayon pool. Always false
    /// without the `parallel` feature.
    pub fn is_parallel(&self) -> bool {
        self.parallel && cfg!(feature = "parallel")
    }

    pub fn enable_detection(
        &mut self,
        config: CollisionDetectionConfig,
        registry: &BodyRegistry,
    ) -> Result<(), ConfigError> {
        validate_detection(&config.target, registry)?;
        if self.detection.is_some() {
            warn!("replacing existing collision detection targets");
        }
        self.detection = Some(config.target);
        Ok(())
    }

    pub fn enable_response(
        &mut self,
        config: ImpulseResponseConfig,
        world: &WorldConfig,
    ) -> Result<(), ConfigError> {
        let mut resolver = ImpulseResolver::from_config(world);
        if let Some(percent) = config.correction_percent {
            if !(0.0..=1.0).contains(&percent) {
                return Err(ConfigError::InvalidWorldSetting {
                    field: "correction_percent",
                    reason: format!("must lie in [0, 1], got {percent}"),
                });
            }
            resolver.correction_percent = percent;
        }
        if let Some(slop) = config.penetration_slop {
            if !(slop.is_finite() && slop >= 0.0) {
                return Err(ConfigError::InvalidWorldSetting {
                    field: "penetration_slop",
                    reason: format!("must be non-negative, got {slop}"),
                });
            }
            resolver.penetration_slop = slop;
        }
        debug!("impulse response enabled: {resolver:?}");
        self.resolver = Some(resolver);
        Ok(())
    }

    pub fn use_sweep_and_prune(&mut self, config: SweepPruneConfig) {
        debug!("broad phase: sweep-and-prune along {:?}", config.axis);
        self.broadphase = Box::new(SweepAndPrune::new(config.axis));
    }

    pub fn validate(&self, registry: &BodyRegistry) -> Result<(), ConfigError> {
        match &self.detection {
            Some(target) => validate_detection(target, registry),
            None => Ok(()),
        }
    }

    /// Overlapping pairs among participating bodies, ordered by handle.
    /// Pairs of two immovable bodies are dropped.
    pub fn candidate_pairs(&mut self, bodies: &[Body]) -> Vec<CandidatePair> {
        let Some(target) = &self.detection else {
            return Vec::new();
        };

        let proxies: Vec<Proxy> = bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| target.includes(body.handle()))
            .map(|(index, body)| Proxy {
                index,
                handle: body.handle(),
                aabb: body.aabb(),
            })
            .collect();

        let mut pairs = self.broadphase.candidate_pairs(&proxies);
        pairs.retain(|pair| !(bodies[pair.a].is_immovable() && bodies[pair.b].is_immovable()));
        pairs.sort_by_key(|pair| {
            let (first, second) = (bodies[pair.a].handle(), bodies[pair.b].handle());
            (first.min(second), first.max(second))
        });
        pairs
    }

    /// Runs the narrow phase over every candidate pair, keeping pair order.
    pub fn detect(
        &self,
        bodies: &[Body],
        pairs: &[CandidatePair],
    ) -> Result<Vec<ContactPair>, ConfigError> {
        let test = |pair: &CandidatePair| -> Result<Option<ContactPair>, ConfigError> {
            Ok(narrowphase::detect(&bodies[pair.a], &bodies[pair.b])?.map(|contact| {
                ContactPair {
                    a: pair.a,
                    b: pair.b,
                    contact,
                }
            }))
        };

        #[cfg(feature = "parallel")]
        if self.is_parallel() {
            let found: Vec<Option<ContactPair>> =
                pairs.par_iter().map(test).collect::<Result<_, ConfigError>>()?;
            return Ok(found.into_iter().flatten().collect());
        }

        let found = pairs.iter().map(test).collect::<Result<Vec<_>, ConfigError>>()?;
        Ok(found.into_iter().flatten().collect())
    }

    /// Resolves contacts one after another in the given order. Returns how
    /// many received an impulse.
    pub fn resolve(&self, bodies: &mut [Body], contacts: &[ContactPair]) -> usize {
        let Some(resolver) = &self.resolver else {
            return 0;
        };

        let mut resolved = 0;
        for pair in contacts {
            if let Some((a, b)) = pair_mut(bodies, pair.a, pair.b) {
                if resolver.resolve(&pair.contact, a, b) {
                    resolved += 1;
                }
            }
        }
        resolved
    }
}

/// Checks detection targets and that every shape pair that can meet has a
/// narrow-phase test.
fn validate_detection(target: &BehaviorTarget, registry: &BodyRegistry) -> Result<(), ConfigError> {
    target.validate(DETECTION, registry, false)?;

    let mut total = [0usize; ShapeKind::ALL.len()];
    let mut dynamic = [0usize; ShapeKind::ALL.len()];
    for body in registry.iter().filter(|b| target.includes(b.handle())) {
        let slot = body.shape().kind() as usize;
        total[slot] += 1;
        if body.is_dynamic() {
            dynamic[slot] += 1;
        }
    }

    for (i, &first) in ShapeKind::ALL.iter().enumerate() {
        for (j, &second) in ShapeKind::ALL.iter().enumerate().skip(i) {
            let can_meet = if i == j {
                total[i] >= 2 && dynamic[i] >= 1
            } else {
                total[i] >= 1 && total[j] >= 1 && (dynamic[i] >= 1 || dynamic[j] >= 1)
            };
            if can_meet && !narrowphase::supports(first, second) {
                return Err(ConfigError::UnsupportedShapePair(first, second));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::body::BodyDesc, utils::allocator::BodyHandle};

    #[test]
    fn two_points_cannot_collide() {
        let mut registry = BodyRegistry::new();
        registry.add(BodyDesc::point().build().unwrap()).unwrap();
        registry
            .add(BodyDesc::point().position(5.0, 0.0).build().unwrap())
            .unwrap();

        let mut manager = CollisionManager::default();
        assert_eq!(
            manager.enable_detection(CollisionDetectionConfig::default(), &registry),
            Err(ConfigError::UnsupportedShapePair(
                ShapeKind::Point,
                ShapeKind::Point
            ))
        );
        assert!(!manager.is_detecting());
    }

    #[test]
    fn parallel_detection_follows_the_feature() {
        assert!(!CollisionManager::new(false).is_parallel());
        assert_eq!(
            CollisionManager::new(true).is_parallel(),
            cfg!(feature = "parallel")
        );
    }

    #[test]
    fn immovable_points_are_ignored() {
        let mut registry = BodyRegistry::new();
        registry.add(BodyDesc::point().immovable().build().unwrap()).unwrap();
        registry.add(BodyDesc::point().immovable().build().unwrap()).unwrap();
        registry.add(BodyDesc::circle(1.0).build().unwrap()).unwrap();

        let mut manager = CollisionManager::default();
        assert!(manager
            .enable_detection(CollisionDetectionConfig::default(), &registry)
            .is_ok());
    }

    #[test]
    fn pairs_are_sorted_by_handle_and_skip_immovable_pairs() {
        let mut registry = BodyRegistry::new();
        let late = registry
            .add(
                BodyDesc::circle(1.0)
                    .handle(BodyHandle(5))
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let wall = registry
            .add(BodyDesc::rectangle(4.0, 4.0).immovable().build().unwrap())
            .unwrap();
        let floor = registry
            .add(BodyDesc::rectangle(4.0, 4.0).immovable().build().unwrap())
            .unwrap();
        let bodies = registry.snapshot();

        let mut manager = CollisionManager::default();
        manager
            .enable_detection(CollisionDetectionConfig::default(), &registry)
            .unwrap();
        let pairs = manager.candidate_pairs(&bodies);
        let handles: Vec<_> = pairs
            .iter()
            .map(|p| (bodies[p.a].handle(), bodies[p.b].handle()))
            .collect();
        assert_eq!(handles, vec![(late, wall), (late, floor)]);
        assert!(wall < floor && late < wall);
    }
}

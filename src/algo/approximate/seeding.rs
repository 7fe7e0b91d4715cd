//! Proxy seeding and insertion.
//!
//! Three seeding strategies are supported: uniform seeding, incremental
//! insertion at the worst face, and hierarchical growth by error diffusion.

use log::{debug, warn};

use crate::mesh::{FaceId, MeshIndex};

use super::proxy::PlaneProxy;
use super::session::{VsaSession, UNASSIGNED};

impl<'a, I: MeshIndex> VsaSession<'a, I> {
    fn reset_proxies(&mut self) {
        self.proxies.clear();
        self.segments.fill(UNASSIGNED);
        self.flooded = false;
    }

    fn push_proxy(&mut self, face: usize) {
        self.proxies
            .push(PlaneProxy::from_face(&self.geometry, FaceId::new(face)));
    }

    fn seed_flags(&self) -> Vec<bool> {
        let mut flags = vec![false; self.mesh.num_faces()];
        for proxy in &self.proxies {
            flags[proxy.seed.index()] = true;
        }
        flags
    }

    /// Replace the proxies by `num_proxies` seeds spread evenly over the
    /// face order.
    pub(super) fn random_seed(&mut self, num_proxies: usize) {
        self.reset_proxies();

        let num_faces = self.mesh.num_faces();
        let interval = (num_faces / num_proxies.max(1)).max(1);
        for face in (0..num_faces).step_by(interval).take(num_proxies) {
            self.push_proxy(face);
        }

        debug!(
            "uniform seeding: {} proxies, interval {}",
            self.proxies.len(),
            interval
        );
    }

    /// Seed half of the regions, then insert the rest one by one.
    pub(super) fn incremental_seed(&mut self, num_proxies: usize, iterations: usize) {
        self.random_seed((num_proxies / 2).max(1));
        self.run_iterations(iterations);

        while self.proxies.len() < num_proxies {
            if !self.insert_proxy() {
                warn!(
                    "no face left to seed a new proxy, stopping at {} of {}",
                    self.proxies.len(),
                    num_proxies
                );
                break;
            }
            self.run_iterations(iterations);
        }
    }

    /// Grow from two seeds, doubling the region count by error diffusion.
    pub(super) fn hierarchical_seed(&mut self, num_proxies: usize) {
        if num_proxies < 2 {
            self.random_seed(num_proxies);
            return;
        }

        self.reset_proxies();
        self.push_proxy(0);
        self.push_proxy(1);

        while self.proxies.len() < num_proxies {
            self.run_iterations(self.hierarchical_steps);

            let current = self.proxies.len();
            let to_add = if current * 2 < num_proxies {
                current
            } else {
                num_proxies - current
            };

            let inserted = self.insert_proxy_error_diffusion(to_add);
            debug!(
                "hierarchical seeding: requested {}, inserted {}, now {}",
                to_add,
                inserted,
                self.proxies.len()
            );
            if inserted == 0 {
                warn!(
                    "error diffusion inserted no proxy, stopping at {} of {}",
                    self.proxies.len(),
                    num_proxies
                );
                break;
            }
        }
    }

    /// Add one proxy at the worst-fitting face of the worst-fitting region.
    ///
    /// Regions are ranked by total error; within the chosen region the first
    /// face with the largest positive error that is not already a seed wins.
    /// Returns `false` when no face qualifies.
    pub fn insert_proxy(&mut self) -> bool {
        if self.proxies.is_empty() {
            return false;
        }
        self.ensure_flooded();

        let num_regions = self.proxies.len();
        let errors = self
            .geometry
            .face_errors(&self.segments, &self.proxies, self.parallel);
        let is_seed = self.seed_flags();

        let mut region_errors = vec![0.0; num_regions];
        let mut worst: Vec<Option<(usize, f64)>> = vec![None; num_regions];
        for (f, (&region, &error)) in self.segments.iter().zip(&errors).enumerate() {
            region_errors[region] += error;
            if is_seed[f] || error <= 0.0 {
                continue;
            }
            match worst[region] {
                Some((_, max)) if error <= max => {}
                _ => worst[region] = Some((f, error)),
            }
        }

        let mut target: Option<(usize, f64)> = None;
        for region in 0..num_regions {
            if worst[region].is_none() {
                continue;
            }
            match target {
                Some((_, max)) if region_errors[region] <= max => {}
                _ => target = Some((region, region_errors[region])),
            }
        }

        match target.and_then(|(region, _)| worst[region]) {
            Some((face, error)) => {
                self.push_proxy(face);
                self.flooded = false;
                debug!("inserted proxy at face {} (error {:.6})", face, error);
                true
            }
            None => false,
        }
    }

    /// Add up to `num_to_add` proxies, distributed over the regions in
    /// proportion to their fit error.
    ///
    /// Regions are visited in ascending error order and receive
    /// `round((residual + error) / average)` new proxies, the rounding
    /// residual carrying over to the next region. The new seeds are the
    /// first non-seed faces of each region in face order. Returns the number
    /// actually inserted, which may be smaller than requested and is `0`
    /// when `num_to_add` is `0` or the partition already fits exactly.
    pub fn insert_proxy_error_diffusion(&mut self, num_to_add: usize) -> usize {
        if num_to_add == 0 || self.proxies.is_empty() {
            return 0;
        }
        self.ensure_flooded();

        let num_regions = self.proxies.len();
        let region_errors = self.proxy_errors();
        let total: f64 = region_errors.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return 0;
        }
        let average = total / num_to_add as f64;

        let mut order: Vec<usize> = (0..num_regions).collect();
        order.sort_by(|&a, &b| region_errors[a].total_cmp(&region_errors[b]));

        let mut quotas = vec![0usize; num_regions];
        let mut residual = 0.0;
        for &region in &order {
            let share = (residual + region_errors[region]) / average;
            let floor = share.floor();
            let quota = if share - floor > 0.5 { floor + 1.0 } else { floor };
            residual = (share - quota) * average;
            quotas[region] = quota.max(0.0) as usize;
        }
        debug!("diffusion quotas: {:?}", quotas);

        let is_seed = self.seed_flags();
        let mut inserted = 0;
        for face in 0..self.mesh.num_faces() {
            if inserted == num_to_add {
                break;
            }
            let region = self.segments[face];
            if is_seed[face] || quotas[region] == 0 {
                continue;
            }
            self.push_proxy(face);
            quotas[region] -= 1;
            inserted += 1;
        }

        if inserted > 0 {
            self.flooded = false;
        }
        inserted
    }
}

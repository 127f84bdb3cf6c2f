use std::collections::HashSet;

use crate::modules::portfolio::domain::entities::{Portfolio, PortfolioId, DEFAULT_PORTFOLIO_NAME};
use crate::shared::clock::LocalIdClock;

/// A correction applied while restoring the collection invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantRepair {
    SynthesizedDefault(PortfolioId),
    ReassignedDuplicateId { from: PortfolioId, to: PortfolioId },
    ReassignedActive { from: PortfolioId, to: PortfolioId },
}

/// The portfolio collection together with the active selection.
///
/// Holds at all times: at least one portfolio, unique local identifiers, and
/// an active identifier naming one of them. Every change goes through
/// [`PortfolioSet::apply`], which restores these before returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioSet {
    portfolios: Vec<Portfolio>,
    active: PortfolioId,
}

impl PortfolioSet {
    pub fn from_parts(
        portfolios: Vec<Portfolio>,
        active: Option<PortfolioId>,
        ids: &mut LocalIdClock,
    ) -> (Self, Vec<InvariantRepair>) {
        let placeholder = portfolios
            .first()
            .map(|p| p.id)
            .unwrap_or_else(|| PortfolioId::from(0));
        let mut set = Self {
            portfolios,
            active: active.unwrap_or(placeholder),
        };
        let repairs = set.enforce(ids);
        (set, repairs)
    }

    pub fn portfolios(&self) -> &[Portfolio] {
        &self.portfolios
    }

    pub fn len(&self) -> usize {
        self.portfolios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portfolios.is_empty()
    }

    pub fn active_id(&self) -> PortfolioId {
        self.active
    }

    pub fn active(&self) -> &Portfolio {
        let index = self
            .portfolios
            .iter()
            .position(|p| p.id == self.active)
            .unwrap_or(0);
        &self.portfolios[index]
    }

    pub fn get(&self, id: PortfolioId) -> Option<&Portfolio> {
        self.portfolios.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PortfolioId) -> bool {
        self.get(id).is_some()
    }

    /// Runs `change` over the raw collection and active selection, then
    /// restores the invariants.
    pub fn apply<R>(
        &mut self,
        ids: &mut LocalIdClock,
        change: impl FnOnce(&mut Vec<Portfolio>, &mut PortfolioId) -> R,
    ) -> (R, Vec<InvariantRepair>) {
        let result = change(&mut self.portfolios, &mut self.active);
        let repairs = self.enforce(ids);
        (result, repairs)
    }

    fn enforce(&mut self, ids: &mut LocalIdClock) -> Vec<InvariantRepair> {
        let mut repairs = Vec::new();

        for portfolio in &self.portfolios {
            ids.observe(portfolio.id.value());
        }

        if self.portfolios.is_empty() {
            let fallback = Portfolio::local(PortfolioId::from(ids.next_id()), DEFAULT_PORTFOLIO_NAME);
            repairs.push(InvariantRepair::SynthesizedDefault(fallback.id));
            self.portfolios.push(fallback);
        }

        let mut seen = HashSet::with_capacity(self.portfolios.len());
        for portfolio in &mut self.portfolios {
            if !seen.insert(portfolio.id) {
                let to = PortfolioId::from(ids.next_id());
                repairs.push(InvariantRepair::ReassignedDuplicateId {
                    from: portfolio.id,
                    to,
                });
                portfolio.id = to;
                seen.insert(to);
            }
        }

        if !seen.contains(&self.active) {
            let to = self.portfolios[0].id;
            repairs.push(InvariantRepair::ReassignedActive {
                from: self.active,
                to,
            });
            self.active = to;
        }

        repairs
    }
}

//! Statement tree to item graph

use super::ast::{ExitTarget, Statement};
use super::diagnostics::{Diagnostic, Loaded, Severity};
use super::sections::{OpenSection, SectionCategory, SectionFilter, SectionStack};
use super::Kleenean;
use crate::config::EngineConfig;
use crate::elements::{Condition, Effect, Expression};
use crate::engine::{
    Await, Branch, Conditional, Continue, Delay, EffectItem, ExecutionIntent, Exit, ItemGraph, ItemId,
    ItemKind, LoopSection, Return, Script, Section, SectionKind, Trigger, WhileSection,
};
use crate::errors::LoadError;
use crate::value::{Value, ValueType};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// What an effect sees while it is being loaded
pub struct LoadContext<'a> {
    has_delay_before: Kleenean,
    event_name: &'a str,
    warnings: Vec<String>,
}

impl<'a> LoadContext<'a> {
    /// Whether a delay may already have happened when this statement runs
    pub fn has_delay_before(&self) -> Kleenean {
        self.has_delay_before
    }

    pub fn event_name(&self) -> &'a str {
        self.event_name
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// What `return` statements in the body must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnContract {
    pub function: String,
    pub returns: Option<ValueType>,
    pub single: bool,
}

#[derive(Debug, Default)]
struct Body {
    first: Option<ItemId>,
    last: Option<ItemId>,
    /// Intent of the first item that stops the body
    intent: ExecutionIntent,
}

/// The `if` / `else if` / `else` chain being built in one body
#[derive(Debug)]
struct Chain {
    delay_before: Kleenean,
    delay_after: Option<Kleenean>,
    /// Each branch's intent as seen from outside the chain
    intents: Vec<ExecutionIntent>,
}

impl Chain {
    fn new(delay_before: Kleenean) -> Self {
        Chain { delay_before, delay_after: None, intents: Vec::new() }
    }
}

pub struct TriggerBuilder {
    script: Arc<Script>,
    label: String,
    event_name: String,
    tick: Duration,
    graph: ItemGraph,
    sections: SectionStack,
    delay: Kleenean,
    contract: Option<ReturnContract>,
    diagnostics: Vec<Diagnostic>,
    line: usize,
}

impl TriggerBuilder {
    pub fn new(script: &Arc<Script>, label: impl Into<String>, event_name: impl Into<String>) -> Self {
        TriggerBuilder {
            script: Arc::clone(script),
            label: label.into(),
            event_name: event_name.into(),
            tick: EngineConfig::default().tick(),
            graph: ItemGraph::new(),
            sections: SectionStack::new(),
            delay: Kleenean::False,
            contract: None,
            diagnostics: Vec::new(),
            line: 0,
        }
    }

    /// Tick length used to check literal delays
    pub fn tick_length(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Build a function body; enables `return`
    pub fn returning(mut self, contract: ReturnContract) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn build(mut self, statements: Vec<Statement>) -> Result<Loaded<Trigger>, LoadError> {
        let body = self.load_body(statements, None);
        self.link_sections();

        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .diagnostics
            .into_iter()
            .partition(|diagnostic| diagnostic.severity == Severity::Error);
        if !errors.is_empty() {
            let mut diagnostics = errors;
            diagnostics.extend(warnings);
            return Err(LoadError { label: self.label, diagnostics });
        }

        for warning in &warnings {
            warn!(target: "tripwire::load", trigger = %self.label, line = warning.line, "{}", warning.message);
        }
        debug!(target: "tripwire::load", trigger = %self.label, items = self.graph.len(), "trigger loaded");

        let trigger = Trigger::new(self.label, self.event_name, self.script, self.graph, body.first);
        Ok(Loaded { value: trigger, warnings })
    }

    /* ===================== Bodies ===================== */

    fn load_body(&mut self, statements: Vec<Statement>, parent: Option<ItemId>) -> Body {
        let mut body = Body::default();
        let mut chain: Option<Chain> = None;
        let mut warned = false;

        for statement in statements {
            self.line += 1;
            if body.intent.stops() && !warned {
                self.warn("Unreachable code. The previous statement stops further execution.");
                warned = true;
            }

            let Some(id) = self.load_statement(statement, parent, &mut chain) else {
                continue;
            };
            match body.last {
                Some(last) => self.graph.set_next(last, Some(id)),
                None => body.first = Some(id),
            }
            body.last = Some(id);
            if !body.intent.stops() {
                body.intent = self
                    .graph
                    .get(id)
                    .map_or(ExecutionIntent::None, |item| item.execution_intent());
            }
        }
        body
    }

    fn load_statement(
        &mut self,
        statement: Statement,
        parent: Option<ItemId>,
        chain: &mut Option<Chain>,
    ) -> Option<ItemId> {
        if !matches!(statement, Statement::ElseIf { .. } | Statement::Else(_)) {
            *chain = None;
        }
        let depth = self.sections.len();

        let kind = match statement {
            Statement::Effect(mut effect) => {
                self.check_effect(&mut effect)?;
                ItemKind::Effect(EffectItem::Host(effect))
            }
            Statement::Condition(condition) => ItemKind::Condition(condition),
            Statement::Guarded { guard, mut effect } => {
                self.check_effect(&mut effect)?;
                let candidate = self.graph.push(ItemKind::Effect(EffectItem::Host(effect)), parent, depth);
                ItemKind::Effect(EffectItem::Guarded { guard, effect: candidate })
            }
            Statement::Delay(duration) => {
                self.check_literal_delay(duration.as_ref())?;
                self.delay = Kleenean::True;
                ItemKind::Effect(EffectItem::Delay(Delay { duration }))
            }
            Statement::Await(operation) => {
                self.delay = Kleenean::True;
                ItemKind::Effect(EffectItem::Await(Await { operation }))
            }
            Statement::Continue(level) => {
                let resolved = self.resolve_continue(level);
                ItemKind::Effect(EffectItem::Continue(self.report(resolved)?))
            }
            Statement::Exit(target) => {
                let resolved = self.resolve_exit(target);
                ItemKind::Effect(EffectItem::Exit(self.report(resolved)?))
            }
            Statement::Return(value) => {
                let resolved = self.resolve_return(value);
                ItemKind::Effect(EffectItem::Return(self.report(resolved)?))
            }
            Statement::If { condition, body } => {
                let mut started = Chain::new(self.delay);
                let id = self.load_branch(Branch::If, Some(condition), body, parent, &mut started);
                *chain = Some(started);
                return Some(id);
            }
            Statement::ElseIf { condition, body } => {
                let Some(open) = chain.as_mut() else {
                    self.error("'else if' has to be placed just after another 'if' or 'else if' section");
                    return None;
                };
                return Some(self.load_branch(Branch::ElseIf, Some(condition), body, parent, open));
            }
            Statement::Else(body) => {
                let Some(mut open) = chain.take() else {
                    self.error("'else' has to be placed just after another 'if' or 'else if' section");
                    return None;
                };
                return Some(self.load_branch(Branch::Else, None, body, parent, &mut open));
            }
            Statement::Loop { expression, body } => {
                let before = self.delay;
                let id = self.graph.next_id();
                let kind = SectionKind::Loop(LoopSection { id, expression });
                let (id, _) = self.load_section(kind, SectionCategory::Loop, body, parent);
                // The body may run zero times
                self.delay = before.merge(self.delay);
                return Some(id);
            }
            Statement::While { condition, body, do_while } => {
                let before = self.delay;
                let id = self.graph.next_id();
                let kind = SectionKind::While(WhileSection { id, condition, do_while });
                let (id, _) = self.load_section(kind, SectionCategory::Loop, body, parent);
                if !do_while {
                    self.delay = before.merge(self.delay);
                }
                return Some(id);
            }
        };

        Some(self.graph.push(kind, parent, depth))
    }

    fn load_section(
        &mut self,
        kind: SectionKind,
        category: SectionCategory,
        statements: Vec<Statement>,
        parent: Option<ItemId>,
    ) -> (ItemId, Body) {
        let depth = self.sections.len();
        let id = self.graph.push(ItemKind::Section(Section::new(kind)), parent, depth);

        self.sections.push(OpenSection { id, category });
        let body = self.load_body(statements, Some(id));
        self.sections.pop();

        if let Some(section) = self.graph.section_mut(id) {
            section.first = body.first;
            section.last = body.last;
        }
        (id, body)
    }

    /// Branches are independent: each starts from the delay state before the chain
    fn load_branch(
        &mut self,
        branch: Branch,
        condition: Option<Box<dyn Condition>>,
        statements: Vec<Statement>,
        parent: Option<ItemId>,
        chain: &mut Chain,
    ) -> ItemId {
        self.delay = chain.delay_before;
        let kind = SectionKind::Conditional(Conditional { branch, condition, skip_to: None });
        let (id, body) = self.load_section(kind, SectionCategory::Conditional, statements, parent);

        let after = self.delay;
        let merged = chain.delay_after.map_or(after, |merged| merged.merge(after));
        chain.delay_after = Some(merged);
        chain.intents.push(body.intent.use_level());

        if branch == Branch::Else {
            self.delay = merged;
            let intent = if chain.intents.iter().all(|intent| intent.stops()) {
                chain.intents.iter().copied().min().unwrap_or_default()
            } else {
                ExecutionIntent::None
            };
            if let Some(section) = self.graph.section_mut(id) {
                section.intent = intent;
            }
        } else {
            // No else yet, so every branch may be skipped
            self.delay = merged.merge(chain.delay_before);
        }
        id
    }

    /* ===================== Linking ===================== */

    /// Point each section body's last item past the body, and relink guarded
    /// effects to their wrapper's position. Ids grow inwards, so outer links are
    /// final before inner sections read them.
    fn link_sections(&mut self) {
        let ids: Vec<ItemId> = self.graph.ids().collect();
        for id in ids {
            let Some(item) = self.graph.get(id) else { continue };
            match &item.kind {
                ItemKind::Section(section) => {
                    let conditional = matches!(section.kind, SectionKind::Conditional(_));
                    let last = section.last;
                    let after = if conditional {
                        let skip_to = self.chain_end(id);
                        if let Some(Section { kind: SectionKind::Conditional(c), .. }) = self.graph.section_mut(id) {
                            c.skip_to = skip_to;
                        }
                        skip_to
                    } else {
                        Some(id)
                    };
                    if let Some(last) = last {
                        self.graph.set_next(last, after);
                    }
                }
                ItemKind::Effect(EffectItem::Guarded { effect, .. }) => {
                    let (candidate, next, parent) = (*effect, item.next, item.parent);
                    self.graph.set_next(candidate, next);
                    self.graph.set_parent(candidate, parent);
                }
                _ => {}
            }
        }
    }

    /// First item after the chain `id` belongs to
    fn chain_end(&self, id: ItemId) -> Option<ItemId> {
        let mut member = id;
        while self.branch_of(member) != Some(Branch::Else) {
            match self.graph.next(member) {
                Some(next) if matches!(self.branch_of(next), Some(Branch::ElseIf | Branch::Else)) => member = next,
                _ => break,
            }
        }
        self.graph.next(member)
    }

    fn branch_of(&self, id: ItemId) -> Option<Branch> {
        match &self.graph.section(id)?.kind {
            SectionKind::Conditional(conditional) => Some(conditional.branch),
            _ => None,
        }
    }

    /* ===================== Jumps ===================== */

    fn resolve_continue(&self, level: Option<usize>) -> Result<Continue, String> {
        let loops = self.sections.count(SectionFilter::Loop);
        if loops == 0 {
            return Err("The 'continue' effect may only be used in loops".to_string());
        }
        let level = level.unwrap_or(loops);
        if level == 0 {
            return Err("Loop levels start at 1, there is no 0th loop to continue".to_string());
        }
        if level > loops {
            return Err(format!(
                "Can't continue the {} loop as {}",
                ordinal(level),
                only_present(loops, SectionFilter::Loop)
            ));
        }

        let mut crossed = self.sections.innermost(loops - level + 1, SectionFilter::Loop);
        let intent = ExecutionIntent::stop_sections(crossed.len());
        let target = crossed.pop().ok_or("The loop to continue is not open")?;
        Ok(Continue { target: target.id, exits: handlers(&crossed), intent })
    }

    fn resolve_exit(&self, target: ExitTarget) -> Result<Exit, String> {
        match target {
            ExitTarget::Trigger => {
                let crossed: Vec<OpenSection> = self.sections.current(SectionFilter::Any).collect();
                Ok(Exit { target: None, exits: handlers(&crossed), intent: ExecutionIntent::StopTrigger })
            }
            ExitTarget::Sections { count, filter } => {
                let open = self.sections.count(filter);
                if open == 0 {
                    return Err(none_present(filter));
                }
                if count == 0 {
                    return Err(format!("Can't stop 0 {}", filter.noun(0)));
                }
                if count > open {
                    return Err(format!(
                        "Can't stop {count} {} as {}",
                        filter.noun(count),
                        only_present(open, filter)
                    ));
                }
                exit_through(self.sections.innermost(count, filter))
            }
            ExitTarget::All(filter) => {
                let outer = self.sections.current(filter).last().ok_or_else(|| none_present(filter))?;
                let mut crossed = self.sections.until(outer.id);
                crossed.push(outer);
                exit_through(crossed)
            }
        }
    }

    fn resolve_return(&self, value: Box<dyn Expression>) -> Result<Return, String> {
        let Some(contract) = &self.contract else {
            return Err("The return statement can only be used in a function".to_string());
        };
        if !self.delay.is_false() {
            return Err("A return statement after a delay is useless, as the calling trigger will resume \
                 when the delay starts (and won't get any returned value)"
                .to_string());
        }
        let Some(returns) = contract.returns else {
            return Err(format!(
                "The function '{}' doesn't return any value. Please use 'stop' or 'exit' if you want to stop the function.",
                contract.function
            ));
        };
        if !returns.accepts(value.return_type()) {
            return Err(format!(
                "The function '{}' is declared to return {}, but {:?} is not of that type.",
                contract.function,
                returns.describe(),
                value
            ));
        }
        if contract.single && !value.is_single() {
            return Err(format!(
                "The function '{}' is defined to only return a single value, but this return statement can return multiple values.",
                contract.function
            ));
        }

        let crossed: Vec<OpenSection> = self.sections.current(SectionFilter::Any).collect();
        Ok(Return { value, returns, exits: handlers(&crossed) })
    }

    /* ===================== Checks ===================== */

    fn check_effect(&mut self, effect: &mut Box<dyn Effect>) -> Option<()> {
        let mut cx = LoadContext {
            has_delay_before: self.delay,
            event_name: &self.event_name,
            warnings: Vec::new(),
        };
        let result = effect.on_load(&mut cx);
        let warnings = cx.warnings;
        for warning in warnings {
            self.warn(warning);
        }
        self.report(result)
    }

    fn check_literal_delay(&mut self, duration: &dyn Expression) -> Option<()> {
        let literal = duration
            .literal()
            .and_then(|values| values.first())
            .and_then(Value::as_timespan);
        match literal {
            Some(span) if span.is_infinite() => {
                self.error("Delaying for an eternity is not allowed. Use the 'stop' effect instead.");
                None
            }
            Some(span) if span.as_ticks(self.tick) == Some(0) => {
                self.warn("Delays less than one tick are not possible, defaulting to one tick.");
                Some(())
            }
            _ => Some(()),
        }
    }

    fn report<T>(&mut self, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.error(message);
                None
            }
        }
    }

    fn error(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(self.line, message));
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(self.line, message));
    }
}

/* ===================== Helpers ===================== */

fn exit_through(crossed: Vec<OpenSection>) -> Result<Exit, String> {
    let outer = crossed.last().ok_or("There is no section to exit")?;
    Ok(Exit {
        target: Some(outer.id),
        exits: handlers(&crossed),
        intent: ExecutionIntent::stop_sections(crossed.len()),
    })
}

fn handlers(crossed: &[OpenSection]) -> Vec<ItemId> {
    crossed
        .iter()
        .filter(|section| section.has_exit_handler())
        .map(|section| section.id)
        .collect()
}

fn none_present(filter: SectionFilter) -> String {
    format!("Can't stop any {0} as there are no {0} present", filter.noun(2))
}

fn only_present(count: usize, filter: SectionFilter) -> String {
    if count == 1 {
        format!("there is only 1 {} present", filter.noun(1))
    } else {
        format!("there are only {count} {} present", filter.noun(count))
    }
}

fn ordinal(n: usize) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

//! Candidate actions and their application
//!
//! The priority-window operations the decision core drives: enumerate the
//! legal actions for a player, apply a chosen action (resolving it
//! immediately, so the stack is empty between decisions), and fast-forward
//! the turn to a later step with auto-declared combat.

use crate::core::{
    ApiKind, Card, CardId, CardType, ManaCost, PlayerId, SpellAbility, SpellAbilityKind, Target,
};
use crate::game::{CombatState, GameEndReason, GameState, Step};
use crate::zones::Zone;
use crate::Result;

impl GameState {
    /// Legal actions for the player in the current priority window
    ///
    /// Targeted spells produce one candidate per concrete target, so a
    /// candidate is always a complete, immediately-playable move. Passing is
    /// not a candidate; callers that want it append a pass pseudo-action.
    pub fn candidate_actions(&self, player_id: PlayerId) -> Vec<SpellAbility> {
        let mut candidates = Vec::new();

        if self.is_game_over() {
            return candidates;
        }

        let sorcery_window =
            self.is_player_turn(player_id) && self.turn.current_step.is_sorcery_speed();

        // Land plays
        if sorcery_window {
            let can_play = self
                .get_player(player_id)
                .map(|p| p.can_play_land())
                .unwrap_or(false);
            if can_play {
                for &card_id in self.cards_in(player_id, Zone::Hand) {
                    let Ok(card) = self.cards.get(card_id) else { continue };
                    if card.is_land() {
                        candidates.push(SpellAbility {
                            kind: SpellAbilityKind::PlayLand { card_id },
                            api: ApiKind::LandPlay,
                            description: format!("Play land: {} ({})", card.name, card_id),
                            host_name: Some(card.name.clone()),
                        });
                    }
                }
            }
        }

        // Castable spells
        for &card_id in self.cards_in(player_id, Zone::Hand) {
            let Ok(card) = self.cards.get(card_id) else { continue };
            if card.is_land() {
                continue;
            }
            if !card.is_instant_or_sorcery() && !sorcery_window {
                continue;
            }
            if card.is_instant_or_sorcery() && !sorcery_window && !card.is_type(CardType::Instant) {
                continue;
            }
            if !self.can_pay(player_id, &card.mana_cost) {
                continue;
            }

            if card.is_instant_or_sorcery() {
                self.push_spell_candidates(player_id, card, &mut candidates);
            } else {
                let api = if card.is_creature() {
                    ApiKind::PermanentCreature
                } else {
                    ApiKind::PermanentNoncreature
                };
                candidates.push(SpellAbility {
                    kind: SpellAbilityKind::CastSpell {
                        card_id: card.id,
                        target: Target::None,
                    },
                    api,
                    description: format!("Cast {} ({})", card.name, card.id),
                    host_name: Some(card.name.clone()),
                });
            }
        }

        candidates
    }

    /// Candidates for a targeted or untargeted instant/sorcery
    fn push_spell_candidates(
        &self,
        player_id: PlayerId,
        card: &Card,
        out: &mut Vec<SpellAbility>,
    ) {
        let api = card.spell_kind.unwrap_or(ApiKind::Generic);
        match api {
            ApiKind::DealDamage => {
                for opp in self.opponents(player_id) {
                    for target_id in self.creatures_in_play(opp) {
                        if let Ok(target) = self.cards.get(target_id) {
                            out.push(self.targeted_candidate(card, api, Target::Permanent(target_id), &format!("{} ({})", target.name, target_id)));
                        }
                    }
                    if let Ok(opp_player) = self.get_player(opp) {
                        out.push(self.targeted_candidate(
                            card,
                            api,
                            Target::Player(opp),
                            opp_player.name.as_str(),
                        ));
                    }
                }
            }
            ApiKind::DestroyPermanent => {
                for opp in self.opponents(player_id) {
                    for target_id in self.creatures_in_play(opp) {
                        if let Ok(target) = self.cards.get(target_id) {
                            if target.has_keyword(&crate::core::Keyword::Indestructible) {
                                continue;
                            }
                            out.push(self.targeted_candidate(card, api, Target::Permanent(target_id), &format!("{} ({})", target.name, target_id)));
                        }
                    }
                }
            }
            ApiKind::Pump => {
                for target_id in self.creatures_in_play(player_id) {
                    if let Ok(target) = self.cards.get(target_id) {
                        out.push(self.targeted_candidate(card, api, Target::Permanent(target_id), &format!("{} ({})", target.name, target_id)));
                    }
                }
            }
            // Untargeted spells
            _ => {
                out.push(SpellAbility {
                    kind: SpellAbilityKind::CastSpell {
                        card_id: card.id,
                        target: Target::None,
                    },
                    api,
                    description: format!("Cast {} ({})", card.name, card.id),
                    host_name: Some(card.name.clone()),
                });
            }
        }
    }

    fn targeted_candidate(
        &self,
        card: &Card,
        api: ApiKind,
        target: Target,
        target_desc: &str,
    ) -> SpellAbility {
        SpellAbility {
            kind: SpellAbilityKind::CastSpell {
                card_id: card.id,
                target,
            },
            api,
            description: format!("Cast {} ({}) targeting {}", card.name, card.id, target_desc),
            host_name: Some(card.name.clone()),
        }
    }

    /// Can the player pay this cost from untapped sources?
    ///
    /// Colored pips are checked per color position against untapped
    /// producers; the total is checked against net producible mana. This is
    /// an approximation that never reports payable costs as unpayable for
    /// single-color-per-source mana bases.
    pub fn can_pay(&self, player_id: PlayerId, cost: &ManaCost) -> bool {
        if self.max_producible_mana(player_id) < cost.cmc() as i32 {
            return false;
        }
        let pips = self.producible_pips(player_id);
        for color in crate::core::Color::ALL {
            if (cost.pips(color) as u32) > pips[color.index()] {
                return false;
            }
        }
        true
    }

    /// Tap mana sources to cover the cost; assumes `can_pay` held
    fn auto_tap_for_cost(&mut self, player_id: PlayerId, cost: &ManaCost) {
        let mut remaining = cost.cmc() as i32;
        let sources: Vec<CardId> = self
            .battlefield
            .cards
            .iter()
            .copied()
            .filter(|&id| {
                self.cards
                    .get(id)
                    .map(|c| c.controller == player_id && !c.tapped && c.is_mana_source())
                    .unwrap_or(false)
            })
            .collect();

        // Colored pips first, from sources that can produce them
        let mut tapped: Vec<CardId> = Vec::new();
        for color in crate::core::Color::ALL {
            let mut need = cost.pips(color) as i32;
            if need == 0 {
                continue;
            }
            for &id in &sources {
                if need == 0 {
                    break;
                }
                if tapped.contains(&id) {
                    continue;
                }
                let Ok(card) = self.cards.get(id) else { continue };
                let produces = card
                    .mana_production
                    .as_ref()
                    .map(|p| p.produces_color(color))
                    .unwrap_or(false);
                if produces {
                    tapped.push(id);
                    need -= 1;
                    remaining -= 1;
                }
            }
        }

        // Anything covers generic
        for &id in &sources {
            if remaining <= 0 {
                break;
            }
            if tapped.contains(&id) {
                continue;
            }
            tapped.push(id);
            remaining -= 1;
        }

        for id in tapped {
            if let Ok(card) = self.cards.get_mut(id) {
                card.tap();
            }
        }
    }

    /// Apply a chosen action and resolve it immediately
    ///
    /// Returns Ok(false) when the action is no longer legal (the search
    /// treats that as a branch to abandon), Ok(true) on success.
    pub fn play_action(&mut self, player_id: PlayerId, action: &SpellAbility) -> Result<bool> {
        if self.is_game_over() {
            return Ok(false);
        }

        match &action.kind {
            SpellAbilityKind::Pass => Ok(true),

            SpellAbilityKind::PlayLand { card_id } => {
                let can_play = self
                    .get_player(player_id)
                    .map(|p| p.can_play_land())
                    .unwrap_or(false);
                let in_hand = self.cards_in(player_id, Zone::Hand).contains(card_id);
                let is_land = self
                    .cards
                    .get(*card_id)
                    .map(|c| c.is_land())
                    .unwrap_or(false);
                if !can_play || !in_hand || !is_land {
                    return Ok(false);
                }

                self.move_card(*card_id, Zone::Hand, Zone::Battlefield, player_id)?;
                let turn = self.turn.turn_number;
                if let Ok(card) = self.cards.get_mut(*card_id) {
                    card.turn_entered_battlefield = Some(turn);
                }
                self.get_player_mut(player_id)?.play_land();
                Ok(true)
            }

            SpellAbilityKind::CastSpell { card_id, target } => {
                let in_hand = self.cards_in(player_id, Zone::Hand).contains(card_id);
                if !in_hand {
                    return Ok(false);
                }
                let (cost, is_permanent) = {
                    let card = self.cards.get(*card_id)?;
                    (card.mana_cost.clone(), !card.is_instant_or_sorcery())
                };
                if !self.can_pay(player_id, &cost) {
                    return Ok(false);
                }
                if !self.target_is_legal(*target) {
                    return Ok(false);
                }

                self.auto_tap_for_cost(player_id, &cost);
                self.move_card(*card_id, Zone::Hand, Zone::Stack, player_id)?;

                // Resolve immediately; the stack empties between decisions
                if is_permanent {
                    self.move_card(*card_id, Zone::Stack, Zone::Battlefield, player_id)?;
                    let turn = self.turn.turn_number;
                    if let Ok(card) = self.cards.get_mut(*card_id) {
                        card.turn_entered_battlefield = Some(turn);
                    }
                } else {
                    self.resolve_spell(player_id, *card_id, *target)?;
                    self.move_card(*card_id, Zone::Stack, Zone::Graveyard, player_id)?;
                }

                self.check_state_based_actions();
                Ok(true)
            }
        }
    }

    fn target_is_legal(&self, target: Target) -> bool {
        match target {
            Target::None => true,
            Target::Player(id) => self.players.contains(id),
            Target::Permanent(id) => self.battlefield.contains(id),
        }
    }

    /// Resolve a non-permanent spell's effect
    fn resolve_spell(&mut self, caster: PlayerId, card_id: CardId, target: Target) -> Result<()> {
        let (api, amount, name) = {
            let card = self.cards.get(card_id)?;
            (
                card.spell_kind.unwrap_or(ApiKind::Generic),
                card.effect_amount.max(0),
                card.name.clone(),
            )
        };

        match api {
            ApiKind::DealDamage => match target {
                Target::Permanent(id) => self.deal_damage_to_creature(id, amount, false)?,
                Target::Player(id) => {
                    self.get_player_mut(id)?.lose_life(amount);
                }
                Target::None => {}
            },
            ApiKind::DestroyPermanent => {
                if let Target::Permanent(id) = target {
                    self.destroy_permanent(id)?;
                }
            }
            ApiKind::DrawCards => {
                for _ in 0..amount {
                    self.draw_card(caster)?;
                }
            }
            ApiKind::GainLife => {
                self.get_player_mut(caster)?.gain_life(amount);
            }
            ApiKind::Token => {
                for n in 0..amount.max(1) {
                    let id = self.next_card_id();
                    let mut token = Card::new(id, format!("{} Token {}", name, n + 1), caster);
                    token.types.push(CardType::Creature);
                    token.power = Some(1);
                    token.toughness = Some(1);
                    token.is_token = true;
                    token.turn_entered_battlefield = Some(self.turn.turn_number);
                    self.cards.insert(id, token);
                    self.battlefield.add(id);
                }
            }
            ApiKind::Pump => {
                if let Target::Permanent(id) = target {
                    if let Ok(card) = self.cards.get_mut(id) {
                        card.power_bonus += amount;
                        card.toughness_bonus += amount;
                    }
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn deal_damage_to_creature(&mut self, id: CardId, amount: i32, deathtouch: bool) -> Result<()> {
        let lethal = {
            let Ok(card) = self.cards.get_mut(id) else { return Ok(()) };
            card.damage_marked += amount;
            (deathtouch && amount > 0) || card.damage_marked >= card.current_toughness()
        };
        if lethal {
            self.destroy_permanent(id)?;
        }
        Ok(())
    }

    fn destroy_permanent(&mut self, id: CardId) -> Result<()> {
        let Ok(card) = self.cards.get(id) else { return Ok(()) };
        if card.has_keyword(&crate::core::Keyword::Indestructible) {
            return Ok(());
        }
        let owner = card.owner;
        let is_token = card.is_token;
        if self.battlefield.contains(id) {
            if is_token {
                // Tokens cease to exist instead of hitting the graveyard
                self.battlefield.remove(id);
                self.cards.remove(id);
            } else {
                self.move_card(id, Zone::Battlefield, Zone::Graveyard, owner)?;
                if let Ok(card) = self.cards.get_mut(id) {
                    card.damage_marked = 0;
                    card.turn_entered_battlefield = None;
                    card.tapped = false;
                }
            }
        }
        Ok(())
    }

    /// Lethal damage, zero-toughness and player-loss checks
    fn check_state_based_actions(&mut self) {
        let dead: Vec<CardId> = self
            .battlefield
            .cards
            .iter()
            .copied()
            .filter(|&id| {
                self.cards
                    .get(id)
                    .map(|c| {
                        c.is_creature()
                            && (c.current_toughness() <= 0
                                || c.damage_marked >= c.current_toughness())
                    })
                    .unwrap_or(false)
            })
            .collect();
        for id in dead {
            let _ = self.destroy_permanent(id);
        }

        let any_lost = self.players.iter().any(|(_, p)| p.has_lost);
        if any_lost {
            let by_poison = self
                .players
                .iter()
                .any(|(_, p)| p.has_lost && p.poison >= 10);
            self.decide_outcome(if by_poison {
                GameEndReason::Poison
            } else {
                GameEndReason::LifeLoss
            });
        }
    }

    /// Deterministically fast-forward to the given step
    ///
    /// Performs the automatic effects of each step passed through, with
    /// auto-declared attackers and blockers. The hook is invoked whenever
    /// the stack is empty at a step boundary (which, with immediate
    /// resolution, is every boundary).
    pub fn advance_to(
        &mut self,
        target: Step,
        on_stack_empty: &mut dyn FnMut(&mut GameState),
    ) {
        // At most one full turn plus the current one; prevents spinning when
        // the game ends mid-advance
        for _ in 0..(2 * Step::COUNT) {
            if self.is_game_over() || self.turn.current_step == target {
                break;
            }

            self.execute_step_effects();

            if !self.turn.advance_step() {
                let next = self.next_player_after(self.turn.active_player);
                self.turn.next_turn(next);
                if let Ok(player) = self.players.get_mut(next) {
                    player.reset_lands_played();
                }
            }

            if self.stack.is_empty() {
                on_stack_empty(self);
            }
        }
    }

    fn next_player_after(&self, current: PlayerId) -> PlayerId {
        let idx = self
            .player_order
            .iter()
            .position(|&id| id == current)
            .unwrap_or(0);
        self.player_order[(idx + 1) % self.player_order.len()]
    }

    /// Automatic effects of the current step
    fn execute_step_effects(&mut self) {
        let active = self.turn.active_player;
        match self.turn.current_step {
            Step::Untap => {
                let _ = self.untap_all(active);
                if let Ok(player) = self.players.get_mut(active) {
                    player.reset_lands_played();
                }
            }
            Step::Draw => {
                let _ = self.draw_card(active);
            }
            Step::DeclareAttackers => {
                if !self.combat.combat_active {
                    self.auto_declare_attackers();
                }
            }
            Step::DeclareBlockers => {
                self.auto_declare_blockers();
            }
            Step::FirstStrikeDamage => {
                self.resolve_combat_damage(true);
            }
            Step::CombatDamage => {
                self.resolve_combat_damage(false);
            }
            Step::EndCombat => {
                self.combat.clear();
            }
            Step::Cleanup => {
                for id in self.battlefield.cards.clone() {
                    if let Ok(card) = self.cards.get_mut(id) {
                        card.damage_marked = 0;
                        card.power_bonus = 0;
                        card.toughness_bonus = 0;
                    }
                }
            }
            _ => {}
        }
    }

    /// Send every able creature of the active player into combat
    fn auto_declare_attackers(&mut self) {
        let active = self.turn.active_player;
        let Some(&defender) = self
            .player_order
            .iter()
            .find(|&&id| id != active)
        else {
            return;
        };
        let turn = self.turn.turn_number;

        for id in self.creatures_in_play(active) {
            let Ok(card) = self.cards.get(id) else { continue };
            if CombatState::can_attack(card, turn) {
                self.combat.add_attacker(id, defender);
            }
        }

        // Attacking taps non-vigilant creatures
        let attackers = self.combat.get_attackers();
        for id in attackers {
            if let Ok(card) = self.cards.get_mut(id) {
                if !card.has_keyword(&crate::core::Keyword::Vigilance) {
                    card.tap();
                }
            }
        }
    }

    /// Assign each able defender to the biggest attacker it can profitably
    /// block: survive the attacker's power or kill it back
    fn auto_declare_blockers(&mut self) {
        let attackers = self.combat.get_attackers();
        if attackers.is_empty() {
            return;
        }

        let mut by_power: Vec<(CardId, i32)> = attackers
            .iter()
            .filter_map(|&id| self.cards.get(id).ok().map(|c| (id, c.current_power())))
            .collect();
        by_power.sort_by_key(|&(_, p)| -p);

        let defenders = self.combat.defenders();
        for defender in defenders {
            let mut blocked: Vec<CardId> = Vec::new();
            for blocker_id in self.creatures_in_play(defender) {
                let Ok(blocker) = self.cards.get(blocker_id) else { continue };
                if blocker.tapped {
                    continue;
                }
                let choice = by_power.iter().find(|&&(attacker_id, _)| {
                    if blocked.contains(&attacker_id) {
                        return false;
                    }
                    let Ok(attacker) = self.cards.get(attacker_id) else {
                        return false;
                    };
                    if !CombatState::can_block(blocker, attacker) {
                        return false;
                    }
                    let survives = blocker.current_toughness() > attacker.current_power()
                        && !attacker.has_deathtouch();
                    let kills = blocker.current_power() >= attacker.current_toughness()
                        || blocker.has_deathtouch();
                    survives || kills
                });
                if let Some(&(attacker_id, _)) = choice {
                    blocked.push(attacker_id);
                    self.combat.add_blocker(blocker_id, attacker_id);
                }
            }
        }
    }

    /// Deal combat damage for one damage sub-step
    fn resolve_combat_damage(&mut self, first_strike_step: bool) {
        let assignments: Vec<(CardId, PlayerId)> = self
            .combat
            .attackers
            .iter()
            .map(|(&a, &d)| (a, d))
            .collect();

        for (attacker_id, defender) in assignments {
            let Ok(attacker) = self.cards.get(attacker_id) else { continue };
            if !self.battlefield.contains(attacker_id) {
                continue;
            }
            let strikes_now = if first_strike_step {
                attacker.has_first_strike() || attacker.has_double_strike()
            } else {
                attacker.has_double_strike() || !attacker.has_first_strike()
            };

            let power = attacker.current_power().max(0);
            let deathtouch = attacker.has_deathtouch();
            let lifelink = attacker.has_lifelink();
            let trample = attacker.has_trample();
            let infect = attacker.has_keyword(&crate::core::Keyword::Infect);
            let controller = attacker.controller;

            let blockers = self.combat.get_blockers(attacker_id);
            let live_blockers: Vec<CardId> = blockers
                .iter()
                .copied()
                .filter(|id| self.battlefield.contains(*id))
                .collect();

            // Blockers strike back regardless of whether the attacker does
            for &blocker_id in &live_blockers {
                let Ok(blocker) = self.cards.get(blocker_id) else { continue };
                let blocker_strikes = if first_strike_step {
                    blocker.has_first_strike() || blocker.has_double_strike()
                } else {
                    blocker.has_double_strike() || !blocker.has_first_strike()
                };
                if blocker_strikes {
                    let bp = blocker.current_power().max(0);
                    let bdt = blocker.has_deathtouch();
                    let blk_lifelink = blocker.has_lifelink();
                    let blk_controller = blocker.controller;
                    let _ = self.deal_damage_to_creature(attacker_id, bp, bdt);
                    if blk_lifelink && bp > 0 {
                        if let Ok(p) = self.get_player_mut(blk_controller) {
                            p.gain_life(bp);
                        }
                    }
                }
            }

            if !strikes_now || power == 0 {
                continue;
            }

            if live_blockers.is_empty() {
                if let Ok(player) = self.get_player_mut(defender) {
                    if infect {
                        player.add_poison(power as u8);
                    } else {
                        player.lose_life(power);
                    }
                }
            } else {
                let mut remaining = power;
                for &blocker_id in &live_blockers {
                    if remaining <= 0 {
                        break;
                    }
                    let toughness_left = self
                        .cards
                        .get(blocker_id)
                        .map(|b| (b.current_toughness() - b.damage_marked).max(0))
                        .unwrap_or(0);
                    let assigned = if deathtouch {
                        1.min(remaining)
                    } else {
                        toughness_left.min(remaining)
                    };
                    let _ = self.deal_damage_to_creature(blocker_id, assigned, deathtouch);
                    remaining -= assigned;
                }
                if trample && remaining > 0 {
                    if let Ok(player) = self.get_player_mut(defender) {
                        player.lose_life(remaining);
                    }
                }
            }

            if lifelink {
                if let Ok(p) = self.get_player_mut(controller) {
                    p.gain_life(power);
                }
            }
        }

        self.check_state_based_actions();
    }
}

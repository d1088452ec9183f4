use crate::state::NO_GROUPS_NOTICE;
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ConfigLoaded(config) => {
            state.apply_config(config);
            Vec::new()
        }
        Msg::GroupsSelected(groups) => {
            state.select_groups(groups);
            Vec::new()
        }
        Msg::MinDaysPresetChosen(days) => {
            state.set_min_days(days);
            Vec::new()
        }
        Msg::CollectClicked => {
            // The trigger stays disabled while a run is in flight.
            if state.collection_running() {
                return (state, Vec::new());
            }
            match state.collection_plan() {
                Some(plan) => {
                    state.begin_collection(plan.len());
                    vec![Effect::StartCollection {
                        groups: plan.steps().to_vec(),
                        min_days: state.min_days(),
                    }]
                }
                None => {
                    state.set_notice(NO_GROUPS_NOTICE);
                    Vec::new()
                }
            }
        }
        Msg::CancelCollectClicked => cancel_collection(&mut state),
        Msg::CollectionStepFinished {
            index,
            total,
            group,
        } => {
            state.apply_collection_step(index, total, group);
            Vec::new()
        }
        Msg::CollectionFinished(summary) => {
            state.finish_collection(summary);
            Vec::new()
        }
        Msg::CollectionRejected(reason) => {
            state.reject_collection(reason);
            Vec::new()
        }
        Msg::DiagnosticsClicked(patterns) => {
            if state.diagnostics_running() {
                Vec::new()
            } else {
                state.begin_diagnostics();
                vec![Effect::StartDiagnostics { patterns }]
            }
        }
        Msg::CancelDiagnosticsClicked => abort_diagnostics(&mut state),
        Msg::DiagnosticsFinished(outcome) => {
            state.finish_diagnostics(outcome);
            Vec::new()
        }
        Msg::ItemsLoaded { group, records } => {
            state.load_records(&group, records);
            Vec::new()
        }
        Msg::DeadlineFilterEntered(raw) => {
            state.change_limits(|limits| limits.set_deadline_from_input(&raw));
            Vec::new()
        }
        Msg::AmountFilterEntered(raw) => {
            state.change_limits(|limits| limits.set_amount_from_input(&raw));
            Vec::new()
        }
        Msg::DeadlineFilterCleared => {
            state.change_limits(|limits| {
                limits.clear_deadline();
                Ok(())
            });
            Vec::new()
        }
        Msg::AmountFilterCleared => {
            state.change_limits(|limits| {
                limits.clear_amount();
                Ok(())
            });
            Vec::new()
        }
        Msg::ExchangeRateFetched(rate) => {
            state.update_rate(rate);
            Vec::new()
        }
        Msg::LinkTokensCounted(tokens) => {
            state.set_link_tokens(tokens);
            Vec::new()
        }
        Msg::PromptPrepared(inputs) => {
            state.set_quote_inputs(inputs);
            Vec::new()
        }
        Msg::SearchFinished(result) => {
            state.set_search_result(result);
            Vec::new()
        }
        Msg::Interrupted => {
            let effects = cancel_collection(&mut state);
            if effects.is_empty() {
                abort_diagnostics(&mut state)
            } else {
                effects
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn cancel_collection(state: &mut AppState) -> Vec<Effect> {
    if state.request_collection_cancel() {
        vec![Effect::CancelCollection]
    } else {
        Vec::new()
    }
}

fn abort_diagnostics(state: &mut AppState) -> Vec<Effect> {
    if state.request_diagnostics_abort() {
        vec![Effect::AbortDiagnostics]
    } else {
        Vec::new()
    }
}

use clap::Subcommand;

use super::{open_engine, print_json, DurationOutput};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a new session in work mode
    Start,
    /// Pause the session (the countdown keeps its anchor)
    Pause,
    /// Resume the session with a fresh full interval
    Resume,
    /// Clear the session
    Reset,
    /// Print a state snapshot as JSON, advancing if due
    Status,
    /// Time spent in the current mode
    Elapsed {
        /// Measure from the start of the whole session instead
        #[arg(long)]
        session: bool,
    },
    /// Time left in the current mode
    Remaining,
    /// Preview the state that follows the current mode
    Next,
    /// Print the stored session state without advancing
    State,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;

    match action {
        TimerAction::Start => print_json(&engine.start_session()?)?,
        TimerAction::Pause => print_json(&engine.pause_session()?)?,
        TimerAction::Resume => print_json(&engine.resume_session()?)?,
        TimerAction::Reset => print_json(&engine.reset_session()?)?,
        TimerAction::Status => {
            let (snapshot, completed) = engine.status()?;
            print_json(&snapshot)?;
            if let Some(event) = completed {
                // Also output completion event
                print_json(&event)?;
            }
        }
        TimerAction::Elapsed { session } => {
            let elapsed = if session {
                engine.session_elapsed()?
            } else {
                engine.elapsed_time()?
            };
            print_json(&DurationOutput::from(elapsed))?;
        }
        TimerAction::Remaining => print_json(&DurationOutput::from(engine.remaining_time()?))?,
        TimerAction::Next => print_json(&engine.next_state_preview()?)?,
        TimerAction::State => print_json(&engine.session_state()?)?,
    }
    Ok(())
}

use crossterm::style::Color;

use crate::client::state::ClientState;
use crate::client::terminal::TerminalContext;

/// Draw one full frame: header, status, history and the input line.
pub fn render(state: &ClientState, input_line: &str, ctx: &mut TerminalContext) -> std::io::Result<()> {
    ctx.clear_screen()?;
    ctx.print_colored_line("strikes & balls", Color::Cyan)?;
    ctx.print_line(&format!("room: {}", state.room_id))?;
    ctx.empty_line()?;
    ctx.print_colored_line(&state.status, Color::Yellow)?;
    ctx.empty_line()?;

    ctx.print_line("history")?;
    for record in &state.history {
        let (who, color) = if record.mine { ("me", Color::Cyan) } else { ("opponent", Color::Blue) };
        ctx.print_colored_line(
            &format!(
                "  {who}: {} - {} strike(s) {} ball(s)",
                record.guess, record.result.strikes, record.result.balls
            ),
            color,
        )?;
    }
    ctx.empty_line()?;

    if state.started {
        ctx.print(&format!("guess (Enter to send, Esc to quit): {input_line}"))?;
    } else {
        ctx.print("Esc to quit")?;
    }
    ctx.flush()
}

//! Menu interativo do requisitante.
//!
//! Usa dialoguer para escolher uma expressão de demonstração por vez.

use dialoguer::{theme::ColorfulTheme, Select};

use super::demo::{demo_expression, DEMO_NAMES};
use crate::client::{CalcClient, RequestOptions};
use crate::{CalcError, CalcResult};

/// Repete o menu até o usuário escolher `exit`.
///
/// Erros de uma troca são impressos e o menu continua; só falhas de
/// conexão encerram o loop.
pub async fn run_client_menu(client: &mut CalcClient, options: RequestOptions) -> CalcResult<()> {
    let theme = ColorfulTheme::default();

    let mut items: Vec<&str> = DEMO_NAMES.to_vec();
    items.push("exit");

    loop {
        let selection = Select::with_theme(&theme)
            .with_prompt("Expression to evaluate")
            .items(&items)
            .default(0)
            .interact()?;

        let name = items[selection];
        let Some(expr) = demo_expression(name) else {
            break;
        };

        println!("\n{name}: {expr}");
        match client.submit(&expr, options).await {
            Ok(computation) => println!("{}\n", computation.render()),
            Err(e) if ends_session(&e) => return Err(e),
            Err(e) => println!("Error: {e}\n"),
        }
    }

    Ok(())
}

/// Só falhas de I/O derrubam a conexão; qualquer outro erro é da troca atual.
fn ends_session(err: &CalcError) -> bool {
    matches!(err, CalcError::Io(_))
}

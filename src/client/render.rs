//! Formatação do rastro de redução para exibição.

/// Alinha os passos em uma cadeia de igualdades.
///
/// ```text
/// (1 + 2) * 4 = 3 * 4
///             = 12
/// ```
///
/// Retorna `None` para um rastro vazio.
pub fn render_trace(steps: &[String]) -> Option<String> {
    let (expr, rest) = steps.split_first()?;
    let Some((first, rest)) = rest.split_first() else {
        return Some(expr.clone());
    };

    let pad = " ".repeat(expr.chars().count());
    let mut lines = vec![format!("{expr} = {first}")];
    lines.extend(rest.iter().map(|step| format!("{pad} = {step}")));
    Some(lines.join("\n"))
}

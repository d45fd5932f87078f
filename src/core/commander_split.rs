use crate::domain::model::{CardEntry, CommanderCard, CommanderIdentity};
use std::collections::HashSet;

/// 把指揮官本身從牌組清單中分出來
///
/// 比對條件：`is_commander` 旗標、完整名稱或任一面名稱 (不分大小寫)。
/// 沒有任何命中時回傳 `None`，清單原樣保留。
pub fn split_commander(
    commander: &CommanderIdentity,
    cards: Vec<CardEntry>,
) -> (Option<CommanderCard>, Vec<CardEntry>) {
    let full_name = commander.display_name.trim().to_lowercase();
    let components: HashSet<String> = commander
        .component_names
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();

    let (matched, remaining): (Vec<CardEntry>, Vec<CardEntry>) = cards.into_iter().partition(|card| {
        let lowered = card.name.to_lowercase();
        card.is_commander || lowered == full_name || components.contains(&lowered)
    });

    let first = match matched.first() {
        Some(first) => first,
        None => return (None, remaining),
    };

    let name = if commander.display_name.trim().is_empty() {
        first.name.clone()
    } else {
        commander.display_name.trim().to_string()
    };
    let qty = matched.iter().map(|c| c.qty).sum();
    let component_names: Vec<String> = matched.iter().map(|c| c.name.clone()).collect();

    let components = if component_names.len() > 1 || !name.eq_ignore_ascii_case(&first.name) {
        Some(component_names)
    } else {
        None
    };

    (Some(CommanderCard { name, qty, components }), remaining)
}

use tree_sitter::Node;

use ciyaml_core::semantic::Command;

use crate::{
    cst::{Pair, node_range},
    parser::{DocumentParser, insert_first_wins},
};

impl<'t> DocumentParser<'t> {
    pub(crate) fn parse_commands(&mut self, node: Node<'t>) {
        for pair in self.pairs(node) {
            let Some(command) = self.parse_command(&pair) else {
                continue;
            };
            if command.name.is_empty() {
                continue;
            }
            let name = command.name.clone();
            insert_first_wins(
                &mut self.commands,
                &mut self.diagnostics,
                name,
                command,
                |command| command.name_range,
                "Command already defined",
            );
        }
    }

    fn parse_command(&mut self, pair: &Pair<'t>) -> Option<Command> {
        let key = pair.key?;
        let mapping = pair.value.and_then(|value| self.cst.mapping_of(value))?;

        let mut command = Command {
            name: self.cst.text(key),
            name_range: node_range(key),
            range: pair.range(),
            ..Command::default()
        };

        for field in self.pairs(mapping) {
            let Some(value) = field.value else {
                continue;
            };
            match self.cst.key_text(&field).as_str() {
                "description" => {
                    command.description = Some(self.cst.text(value));
                    command.description_range = field.range();
                }
                "steps" => {
                    command.steps_range = node_range(value);
                    command.steps = self.parse_steps(value);
                }
                "parameters" => {
                    command.parameters_range = node_range(value);
                    command.parameters = self.parse_parameters(value);
                }
                _ => {}
            }
        }
        Some(command)
    }
}

use ciyaml_core::semantic::Command;
use ciyaml_parser::error::{Diagnostic, DiagnosticTag, ErrorCode};

use super::{Validator, any_step};

impl Validator<'_> {
    pub(super) fn validate_commands(&mut self) {
        let document = self.document;
        for command in document.commands().values() {
            self.validate_steps(&command.steps, &command.parameters);
            if self.is_unused_orb_command(command) {
                self.emit(
                    Diagnostic::warning("Command is unused")
                        .with_code(ErrorCode::E300)
                        .with_range(command.name_range)
                        .with_tag(DiagnosticTag::Unnecessary),
                );
            }
        }
    }

    /// Only commands of local orbs are checked: a command of the main
    /// document may be left for a later change to call.
    fn is_unused_orb_command(&self, command: &Command) -> bool {
        let (Some(orb), Some(parent)) = (self.local_orb, self.parent) else {
            return false;
        };
        if !self.config.validation().unused() {
            return false;
        }

        let name = command.name.as_str();
        let document = self.document;
        let used_inside = document
            .commands()
            .values()
            .map(|command| &command.steps)
            .chain(document.jobs().values().map(|job| &job.steps))
            .any(|steps| any_step(steps, |step| step.name() == name));
        if used_inside {
            return false;
        }

        let qualified = format!("{orb}/{name}");
        let used_by_parent = parent
            .commands()
            .values()
            .map(|command| &command.steps)
            .chain(parent.jobs().values().map(|job| &job.steps))
            .chain(
                parent
                    .workflows()
                    .values()
                    .flat_map(|workflow| &workflow.job_refs)
                    .flat_map(|job_ref| [&job_ref.pre_steps, &job_ref.post_steps]),
            )
            .any(|steps| any_step(steps, |step| step.name() == qualified));
        !used_by_parent
    }
}

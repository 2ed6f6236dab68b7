//! Hello World - prints one message

use crate::feature::{Feature, FormWidget, OptionField, OptionsForm, TaskContext};
use twirtee_foundation::Result;

#[derive(Default)]
pub struct HelloWorld {
    message: String,
}

impl Feature for HelloWorld {
    fn name(&self) -> &str {
        "Hello World"
    }

    fn icon(&self) -> &str {
        "chat-bubble"
    }

    fn init(&mut self) -> Result<()> {
        self.message = "Hello World!".to_string();
        Ok(())
    }

    fn main(&self, ctx: &TaskContext) -> Result<()> {
        ctx.println(ctx.options().text_or("message", &self.message));
        Ok(())
    }

    fn options(&self) -> OptionsForm {
        OptionsForm::new(FormWidget::new(vec![
            OptionField::text("message", self.message.clone()).label("Message"),
        ]))
    }
}

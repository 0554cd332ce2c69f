#[cfg(test)]
mod tests {
  use crate::format::{ActionKind, FormatPlan, DEFAULT_TIME_FORMAT};
  use crate::level::Level;
  use crate::record::{CallSite, Slot};

  fn slot(level: Level, message: &str) -> Slot {
    let mut slot = Slot::new(256);
    slot.level = level;
    slot.fill_str(message, 256);
    slot
  }

  fn rendered(plan: &FormatPlan, slot: &Slot) -> String {
    let mut out = String::new();
    plan.render(slot, &mut out);
    out
  }

  #[test]
  fn test_literals_fold_into_dynamic_actions() {
    let plan = FormatPlan::compile("main", "{name} - {message} - {name}");
    assert_eq!(plan.actions.len(), 1);
    assert_eq!(plan.actions[0].kind, ActionKind::Message);
    assert_eq!(plan.actions[0].format, "main - %s - main\n");
  }

  #[test]
  fn test_basic_format_renders() {
    let plan = FormatPlan::compile("main", "{name} - {message} - {name}");
    assert_eq!(rendered(&plan, &slot(Level::Debug, "test")), "main - test - main\n");
  }

  #[test]
  fn test_level_round_trip() {
    let plan = FormatPlan::compile("main", "{level}");
    assert_eq!(rendered(&plan, &slot(Level::Debug, "")), "DEBUG\n");
    assert_eq!(rendered(&plan, &slot(Level::Emergency, "")), "EMERG\n");
  }

  #[test]
  fn test_message_only_round_trip() {
    let plan = FormatPlan::compile("main", "{message}");
    assert_eq!(rendered(&plan, &slot(Level::Info, "payload")), "payload\n");
  }

  #[test]
  fn test_message_appended_when_absent() {
    let plan = FormatPlan::compile("main", "{level} ");
    assert_eq!(rendered(&plan, &slot(Level::Info, "tail")), "INFO tail\n");
  }

  #[test]
  fn test_decimal_divisor_from_width() {
    let plan = FormatPlan::compile("main", "{decimal:%03d}");
    assert_eq!(plan.nsec_divisor, 1_000_000);

    let mut record = slot(Level::Debug, "");
    record.nsec = 123_456_789;
    assert_eq!(rendered(&plan, &record), "123\n");
  }

  #[test]
  fn test_decimal_divisor_widths() {
    assert_eq!(FormatPlan::compile("m", "{decimal:%06d}").nsec_divisor, 1_000);
    assert_eq!(FormatPlan::compile("m", "{decimal:%09d}").nsec_divisor, 1);
    assert_eq!(FormatPlan::compile("m", "{decimal:%-6d}").nsec_divisor, 1_000);
    assert_eq!(FormatPlan::compile("m", "{decimal}").nsec_divisor, 1);
  }

  #[test]
  fn test_decimal_zero_pads() {
    let plan = FormatPlan::compile("main", "{decimal:%03d}");
    let mut record = slot(Level::Debug, "");
    record.nsec = 7_000_001;
    assert_eq!(rendered(&plan, &record), "007\n");
  }

  #[test]
  fn test_escaped_braces_render_literally() {
    let plan = FormatPlan::compile("main", "\\{\\}");
    assert_eq!(rendered(&plan, &slot(Level::Debug, "")), "{}\n");
  }

  #[test]
  fn test_escaped_colon_inside_spec() {
    let plan = FormatPlan::compile("main", "{time:%H\\:%M}");
    assert_eq!(plan.time_format, "%H:%M");
  }

  #[test]
  fn test_time_defaults() {
    let plan = FormatPlan::compile("main", "{time}");
    assert_eq!(plan.time_format, DEFAULT_TIME_FORMAT);
    assert_eq!(plan.actions[0].kind, ActionKind::Time);
    assert_eq!(plan.actions[0].format, "%s");
  }

  #[test]
  fn test_percent_in_literal_survives() {
    let plan = FormatPlan::compile("main", "100% {message}");
    assert_eq!(rendered(&plan, &slot(Level::Debug, "done")), "100% done\n");
  }

  #[test]
  fn test_unknown_key_disappears() {
    let plan = FormatPlan::compile("main", "{bogus}{message}");
    assert_eq!(rendered(&plan, &slot(Level::Debug, "m")), "m\n");
  }

  #[test]
  fn test_color_keys_emit_ansi() {
    let plan = FormatPlan::compile("main", "{fg_red}{message}{color_reset}");
    assert_eq!(
      rendered(&plan, &slot(Level::Error, "boom")),
      "\x1b[31mboom\x1b[0m\n"
    );
  }

  #[test]
  fn test_unbalanced_brace_becomes_literal_tail() {
    let plan = FormatPlan::compile("main", "{message} {oops");
    assert_eq!(rendered(&plan, &slot(Level::Debug, "m")), "m {oops\n");
  }

  #[test]
  fn test_name_is_prerendered() {
    let plan = FormatPlan::compile("prod", "{name:%10s}");
    assert!(plan.actions.iter().all(|a| a.kind != ActionKind::Name));
    assert_eq!(rendered(&plan, &slot(Level::Info, "")), "      prod\n");
  }

  #[test]
  fn test_pid_is_prerendered() {
    let plan = FormatPlan::compile("main", "{pid}");
    let pid = std::process::id().to_string();
    let line = rendered(&plan, &slot(Level::Info, ""));
    assert!(line.starts_with(&pid), "{line:?} should start with {pid}");
  }

  #[test]
  fn test_call_site_actions_skipped_without_site() {
    let plan = FormatPlan::compile("main", "{file}:{line} {message}");
    let mut record = slot(Level::Debug, "m");
    record.site = None;
    // ":" folded into {line} vanishes with it; " " folded into {message} stays
    assert_eq!(rendered(&plan, &record), " m\n");
  }

  #[test]
  fn test_call_site_actions_render_with_site() {
    let plan = FormatPlan::compile("main", "{file}:{line} {func} {message}");
    let mut record = slot(Level::Debug, "m");
    record.site = Some(CallSite {
      path: "src/worker/ingress.rs",
      line: 7,
      function: "demo",
    });
    assert_eq!(rendered(&plan, &record), "ingress.rs:7 demo m\n");
  }

  #[test]
  fn test_rendering_is_idempotent() {
    let plan = FormatPlan::compile("main", "{level:%-6s} {message}");
    let record = slot(Level::Notice, "same");
    assert_eq!(rendered(&plan, &record), rendered(&plan, &record));
  }
}

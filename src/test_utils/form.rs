use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

/// Check the form posts to `endpoint`.
#[track_caller]
pub(crate) fn assert_form_action(form: &ElementRef<'_>, endpoint: &str) {
    let method = form.value().attr("method").unwrap_or_default();
    assert!(
        method.eq_ignore_ascii_case("post"),
        "want form with method=\"post\", got {method:?}"
    );

    let action = form
        .value()
        .attr("action")
        .unwrap_or_else(|| panic!("action attribute missing"));
    assert_eq!(
        action, endpoint,
        "want form with attribute action=\"{endpoint}\", got {action:?}"
    );
}

#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    for input in form.select(&Selector::parse("input").unwrap()) {
        let input_name = input.value().attr("name").unwrap_or_default();

        if input_name == name {
            let input_type = input.value().attr("type").unwrap_or_default();
            let input_required = input.value().attr("required");

            assert_eq!(
                input_type, type_,
                "want input with type \"{type_}\", got {input_type:?}"
            );

            assert!(
                input_required.is_some(),
                "want input with name {name} to have the required attribute but got none"
            );

            return;
        }
    }

    panic!("No input found with name \"{name}\" and type \"{type_}\"");
}

#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    for input in form.select(&Selector::parse("input").unwrap()) {
        let input_name = input.value().attr("name").unwrap_or_default();
        let input_type = input.value().attr("type").unwrap_or_default();

        // Radio buttons share a name, so match on the value too.
        if input_name == name && (type_ != "radio" || input.value().attr("value") == Some(value))
        {
            let input_value = input.value().attr("value").unwrap_or_default();

            assert_eq!(
                input_type, type_,
                "want input with type \"{type_}\", got {input_type:?}"
            );
            assert_eq!(
                input_value, value,
                "want input with value \"{value}\", got {input_value:?}"
            );

            return;
        }
    }

    panic!("No input found with name \"{name}\", type \"{type_}\" and value \"{value}\"");
}

/// Check that the radio button for `name` with `value` is selected.
#[track_caller]
pub(crate) fn assert_radio_checked(form: &ElementRef<'_>, name: &str, value: &str) {
    let selector = Selector::parse(&format!(
        "input[type=radio][name=\"{name}\"][value=\"{value}\"]"
    ))
    .unwrap();
    let radio = form
        .select(&selector)
        .next()
        .unwrap_or_else(|| panic!("No radio button {name}={value}"));

    assert!(
        radio.value().attr("checked").is_some(),
        "want radio button {name}={value} to be checked"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button_with_text(form: &ElementRef<'_>, text: &str) {
    let submit_button = form
        .select(&Selector::parse("button").unwrap())
        .next()
        .expect("No button found");

    assert_eq!(
        submit_button.value().attr("type").unwrap_or_default(),
        "submit",
        "want submit button with type=\"submit\""
    );
    let got_text = submit_button.text().collect::<Vec<_>>().join("");
    let got_text = got_text.trim();
    assert_eq!(text, got_text);
}

/// Get the text of every error message in the form.
pub(crate) fn get_form_error_messages(form: &ElementRef<'_>) -> Vec<String> {
    form.select(&Selector::parse("p.text-red-500").unwrap())
        .map(|error| error.text().collect::<String>().trim().to_owned())
        .collect()
}

#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let error_messages = get_form_error_messages(form);

    assert!(
        error_messages
            .iter()
            .any(|message| message == want_error_message),
        "want error message {want_error_message:?}, got {error_messages:?}"
    );
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Derive macro for value objects stored as a JSON column.
///
/// Generates, on the annotated struct:
///
/// - `impl caster_api::ValueObject`: the ordered field table plus both
///   conversion directions (`to_object`, `from_object`).
/// - `impl caster_api::FieldValue`, so the struct can be nested inside
///   other value objects or lists.
///
/// `from_object` first checks that every required field is present and
/// reports all missing names at once. Unknown keys are ignored.
///
/// # Example
///
/// ```ignore
/// #[derive(ValueObject)]
/// #[value(name = "Address")]
/// pub struct Address {
///     pub street: String,
///     #[value(rename = "postCode")]
///     pub post_code: Option<String>,
///     pub moved: DateTime<FixedOffset>,
/// }
/// ```
///
/// Every field type must implement `caster_api::FieldValue`.
#[proc_macro_derive(ValueObject, attributes(value))]
pub fn derive_value_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens,
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream, syn::Error> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "ValueObject does not support generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "ValueObject only supports structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "ValueObject only supports structs",
            ))
        }
    };

    // Parse #[value(name = "...")] on the struct.
    let mut type_name = name.to_string();
    for attr in &input.attrs {
        if !attr.path().is_ident("value") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                type_name = value.value();
                Ok(())
            } else {
                Err(meta.error("unknown value attribute (expected `name`)"))
            }
        })?;
    }

    let mut field_def_tokens = Vec::new();
    let mut encode_tokens = Vec::new();
    let mut decode_tokens = Vec::new();
    let mut seen_keys: Vec<String> = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;
        let field_ty = &field.ty;

        // Parse #[value(rename = "...")] on the field.
        let mut key = field_name.to_string();
        for attr in &field.attrs {
            if !attr.path().is_ident("value") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    key = value.value();
                    Ok(())
                } else {
                    Err(meta.error("unknown value attribute (expected `rename`)"))
                }
            })?;
        }

        if seen_keys.contains(&key) {
            return Err(syn::Error::new_spanned(
                field_name,
                format!("duplicate JSON key '{key}'"),
            ));
        }
        seen_keys.push(key.clone());

        field_def_tokens.push(quote! {
            caster_api::schema::FieldDef::new(
                #key,
                <#field_ty as caster_api::value::FieldValue>::kind(),
                <#field_ty as caster_api::value::FieldValue>::required(),
            )
        });

        encode_tokens.push(quote! {
            __object.insert(
                #key.to_string(),
                caster_api::value::encode_field(&self.#field_name, #key)?,
            );
        });

        decode_tokens.push(quote! {
            #field_name: caster_api::value::decode_field(__object, #key, #type_name)?
        });
    }

    let expanded = quote! {
        impl caster_api::value::ValueObject for #name {
            fn type_name() -> &'static str {
                #type_name
            }

            fn fields() -> Vec<caster_api::schema::FieldDef> {
                vec![
                    #(#field_def_tokens),*
                ]
            }

            fn to_object(
                &self,
            ) -> Result<
                caster_api::serde_json::Map<String, caster_api::serde_json::Value>,
                caster_api::error::CastError,
            > {
                let mut __object = caster_api::serde_json::Map::new();
                #(#encode_tokens)*
                Ok(__object)
            }

            fn from_object(
                __object: &caster_api::serde_json::Map<String, caster_api::serde_json::Value>,
            ) -> Result<Self, caster_api::error::CastError> {
                caster_api::value::check_required(
                    #type_name,
                    &<Self as caster_api::value::ValueObject>::fields(),
                    __object,
                )?;
                Ok(Self {
                    #(#decode_tokens),*
                })
            }
        }

        impl caster_api::value::FieldValue for #name {
            fn kind() -> caster_api::schema::FieldKind {
                caster_api::schema::FieldKind::Object(#type_name.to_string())
            }

            fn encode(
                &self,
            ) -> Result<caster_api::serde_json::Value, caster_api::error::CastError> {
                caster_api::value::encode_object(self)
            }

            fn decode(
                value: &caster_api::serde_json::Value,
            ) -> Result<Self, caster_api::error::CastError> {
                caster_api::value::decode_object(value)
            }
        }
    };

    Ok(TokenStream::from(expanded))
}

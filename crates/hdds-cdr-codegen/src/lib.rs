// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DataEnum, DeriveInput, Expr, ExprLit,
    ExprUnary, Fields, FieldsNamed, GenericArgument, Generics, Lit, PathArguments, Type, UnOp,
};

/// Largest member id an EMHEADER can carry (28 bits).
const MAX_MEMBER_ID: u32 = 0x0FFF_FFFF;

/// `#[derive(Cdr)]`: generates `CdrEncode`, `CdrDecode`, `DescribeType` and
/// `NativeType`.
///
/// Structs with named fields become aggregates; every field type must itself
/// implement those traits. `Option<T>` fields are optional members.
/// Unit-only enums become 32-bit enumerations.
///
/// A non-generic struct `Name` also gets a `NameView<'a>` over its native
/// form, with one typed accessor per field and `to_owned()`.
///
/// Attributes:
/// - `#[cdr(final)]`, `#[cdr(appendable)]` (default), `#[cdr(mutable)]` on the type
/// - `#[cdr(id = N)]` on a field: explicit member id; following fields continue from N + 1
/// - `#[cdr(key)]` on a field: key member, sent with the must-understand flag
/// - `#[cdr(default)]` on a field: decodes as `Default::default()` when an older
///   writer did not send it
/// - `#[cdr(required)]` on a field: a missing member fails the decode
///
/// Without either attribute a member missing from the wire takes its type's
/// default (zero, empty, first enumerator), as XTypes assignability requires.
///
/// Example:
/// ```ignore
/// use hdds_cdr::Cdr;
///
/// #[derive(Cdr)]
/// #[cdr(mutable)]
/// struct Pose {
///     #[cdr(key)]
///     frame_id: u32,
///     #[cdr(id = 10)]
///     position: [f64; 3],
///     label: Option<String>,   // id 11
/// }
/// ```
#[proc_macro_derive(Cdr, attributes(cdr))]
pub fn derive_cdr(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let expanded = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => derive_struct(&input, fields),
            _ => Err(syn::Error::new_spanned(
                &input,
                "Cdr supports structs with named fields",
            )),
        },
        Data::Enum(data) => derive_enum(&input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input,
            "Cdr cannot be derived for Rust unions",
        )),
    };
    expanded.unwrap_or_else(syn::Error::into_compile_error).into()
}

struct Member {
    ident: syn::Ident,
    /// Value type; for optional members the type inside `Option`.
    ty: Type,
    id: u32,
    key: bool,
    optional: bool,
    /// Missing on the wire decodes as `Default::default()`.
    default: bool,
    /// Missing on the wire is an error.
    required: bool,
}

fn derive_struct(input: &DeriveInput, fields: &FieldsNamed) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let type_name = name.to_string();
    let extensibility = type_extensibility(&input.attrs)?;

    let mut members = Vec::new();
    let mut next_id = 0u32;
    for field in &fields.named {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "field must have a name"));
        };
        let attrs = member_attrs(&field.attrs)?;
        let id = attrs.id.unwrap_or(next_id);
        if id > MAX_MEMBER_ID {
            return Err(syn::Error::new_spanned(
                field,
                format!("member id {id} does not fit in 28 bits"),
            ));
        }
        if members.iter().any(|m: &Member| m.id == id) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate member id {id}"),
            ));
        }
        next_id = id.wrapping_add(1);
        let (ty, optional) = match option_inner(&field.ty) {
            Some(inner) => (inner.clone(), true),
            None => (field.ty.clone(), false),
        };
        if optional && (attrs.required || attrs.default) {
            return Err(syn::Error::new_spanned(
                field,
                "optional members cannot be `required` or `default`",
            ));
        }
        members.push(Member {
            ident,
            ty,
            id,
            key: attrs.key,
            optional,
            default: attrs.default,
            required: attrs.required,
        });
    }

    let encode_members = members.iter().map(|m| {
        let (ident, id, key) = (&m.ident, m.id, m.key);
        if m.optional {
            quote! { encoder.optional(#id, #key, self.#ident.as_ref())?; }
        } else {
            quote! { encoder.member(#id, #key, &self.#ident)?; }
        }
    });

    // Locals are prefixed so member names cannot shadow `decoder` or `header`.
    let slot = |m: &Member| format_ident!("member_{}", m.ident);
    let slots = members.iter().map(|m| {
        let (local, ty) = (slot(m), &m.ty);
        quote! { let mut #local: ::core::option::Option<#ty> = ::core::option::Option::None; }
    });
    let arms = members.iter().map(|m| {
        let (local, id) = (slot(m), m.id);
        quote! { #id => #local = ::core::option::Option::Some(decoder.value(&header)?), }
    });
    let mutable_values = members.iter().map(|m| {
        let (ident, local) = (&m.ident, slot(m));
        if m.optional {
            quote! { #ident: #local }
        } else if m.default {
            quote! { #ident: #local.unwrap_or_default() }
        } else {
            let missing = format!("{type_name}: missing member {ident}");
            let found = if m.required {
                quote! { #local }
            } else {
                let ty = &m.ty;
                quote! { #local.or_else(<#ty as ::hdds_cdr::CdrDecode>::absent) }
            };
            quote! {
                #ident: #found.ok_or_else(|| {
                    ::hdds_cdr::CdrError::InvalidValue(#missing.into())
                })?
            }
        }
    });
    let positional = members.iter().map(|m| {
        let (local, ty) = (slot(m), &m.ty);
        if m.optional {
            quote! { let #local = decoder.optional::<#ty>()?; }
        } else if m.default {
            quote! { let #local = decoder.member_or_default::<#ty>()?; }
        } else if m.required {
            let field_name = m.ident.to_string();
            quote! { let #local = decoder.required::<#ty>(#field_name)?; }
        } else {
            quote! { let #local = decoder.member::<#ty>()?; }
        }
    });
    // A type with a required member has no stand-in value.
    let absent = if members.iter().any(|m| m.required) {
        quote! { ::core::option::Option::None }
    } else {
        let values = members.iter().map(|m| {
            let (ident, ty) = (&m.ident, &m.ty);
            if m.optional {
                quote! { #ident: ::core::option::Option::None }
            } else if m.default {
                quote! { #ident: ::core::default::Default::default() }
            } else {
                quote! { #ident: <#ty as ::hdds_cdr::CdrDecode>::absent()? }
            }
        });
        quote! { ::core::option::Option::Some(Self { #(#values),* }) }
    };
    let positional_values = members.iter().map(|m| {
        let (ident, local) = (&m.ident, slot(m));
        quote! { #ident: #local }
    });

    let descriptors = members.iter().map(|m| {
        let (ty, id) = (&m.ty, m.id);
        let field_name = m.ident.to_string();
        let mut field = quote! {
            ::hdds_cdr::dynamic::FieldDescriptor::new(
                #field_name,
                <#ty as ::hdds_cdr::DescribeType>::type_descriptor(),
            )
            .with_id(#id)
        };
        if m.optional {
            field = quote! { #field.optional() };
        }
        if m.key {
            field = quote! { #field.key() };
        }
        field
    });

    let encode_generics = bounded(&input.generics, &[quote! { ::hdds_cdr::CdrEncode }]);
    let decode_generics = bounded(
        &input.generics,
        &[quote! { ::hdds_cdr::CdrEncode }, quote! { ::hdds_cdr::CdrDecode }],
    );
    let describe_generics = bounded(&input.generics, &[quote! { ::hdds_cdr::DescribeType }]);
    let (enc_impl, ty_generics, enc_where) = encode_generics.split_for_impl();
    let (dec_impl, _, dec_where) = decode_generics.split_for_impl();
    let (desc_impl, _, desc_where) = describe_generics.split_for_impl();
    let native = if input.generics.params.is_empty() {
        native_struct(input, &members)?
    } else {
        TokenStream2::new()
    };

    Ok(quote! {
        impl #enc_impl ::hdds_cdr::CdrEncode for #name #ty_generics #enc_where {
            const EXTENSIBILITY: ::hdds_cdr::Extensibility = #extensibility;

            fn encode<S: ::hdds_cdr::CdrSink>(&self, sink: &mut S) -> ::hdds_cdr::Result<()> {
                let mut encoder =
                    ::hdds_cdr::xtypes::StructEncoder::begin(sink, <Self as ::hdds_cdr::CdrEncode>::EXTENSIBILITY)?;
                #(#encode_members)*
                encoder.finish()
            }
        }

        impl #dec_impl ::hdds_cdr::CdrDecode for #name #ty_generics #dec_where {
            fn decode(reader: &mut ::hdds_cdr::CdrReader<'_>) -> ::hdds_cdr::Result<Self> {
                let mut decoder =
                    ::hdds_cdr::xtypes::StructDecoder::begin(reader, <Self as ::hdds_cdr::CdrEncode>::EXTENSIBILITY)?;
                if decoder.extensibility() == ::hdds_cdr::Extensibility::Mutable {
                    #(#slots)*
                    while let ::core::option::Option::Some(header) = decoder.next_member()? {
                        match header.member_id {
                            #(#arms)*
                            _ => decoder.skip(&header)?,
                        }
                    }
                    decoder.finish()?;
                    ::core::result::Result::Ok(Self { #(#mutable_values),* })
                } else {
                    #(#positional)*
                    decoder.finish()?;
                    ::core::result::Result::Ok(Self { #(#positional_values),* })
                }
            }

            fn absent() -> ::core::option::Option<Self> {
                #absent
            }
        }

        impl #desc_impl ::hdds_cdr::DescribeType for #name #ty_generics #desc_where {
            fn type_descriptor() -> ::std::sync::Arc<::hdds_cdr::dynamic::TypeDescriptor> {
                ::std::sync::Arc::new(::hdds_cdr::dynamic::TypeDescriptor::struct_type(
                    #type_name,
                    #extensibility,
                    ::std::vec![#(#descriptors),*],
                ))
            }
        }

        #native
    })
}

/// Method names of the generated view that a field accessor must not take.
const VIEW_METHODS: [&str; 4] = ["new", "from_struct", "as_struct", "to_owned"];

/// `NativeType` for a struct plus its `NameView<'a>`.
fn native_struct(input: &DeriveInput, members: &[Member]) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let vis = &input.vis;
    let type_name = name.to_string();
    let view = format_ident!("{}View", name);

    if let Some(m) = members
        .iter()
        .find(|m| VIEW_METHODS.contains(&m.ident.to_string().as_str()))
    {
        return Err(syn::Error::new_spanned(
            &m.ident,
            format!("field `{}` clashes with a method of {}", m.ident, view),
        ));
    }

    let writes = members.iter().map(|m| {
        let (ident, field_name) = (&m.ident, m.ident.to_string());
        if m.optional {
            quote! {
                ::hdds_cdr::native::write_optional_member(
                    sink, at, layout, #field_name, self.#ident.as_ref(),
                )?;
            }
        } else {
            quote! {
                ::hdds_cdr::native::write_member(sink, at, layout, #field_name, &self.#ident)?;
            }
        }
    });
    let accessors = members.iter().map(|m| {
        let (ident, ty, field_name) = (&m.ident, &m.ty, m.ident.to_string());
        let doc = format!("`{field_name}` read in place.");
        if m.optional {
            quote! {
                #[doc = #doc]
                pub fn #ident(
                    &self,
                ) -> ::hdds_cdr::Result<::core::option::Option<<#ty as ::hdds_cdr::native::NativeType>::View<'a>>> {
                    self.inner.view_optional::<#ty>(#field_name)
                }
            }
        } else {
            quote! {
                #[doc = #doc]
                pub fn #ident(&self) -> ::hdds_cdr::Result<<#ty as ::hdds_cdr::native::NativeType>::View<'a>> {
                    self.inner.view::<#ty>(#field_name)
                }
            }
        }
    });
    let owned = members.iter().map(|m| {
        let (ident, ty, field_name) = (&m.ident, &m.ty, m.ident.to_string());
        if m.optional {
            quote! { #ident: self.inner.read_optional::<#ty>(#field_name)? }
        } else {
            quote! { #ident: self.inner.read::<#ty>(#field_name)? }
        }
    });
    let view_doc = format!("Zero-copy view of a native [`{type_name}`].");
    let owned_doc = format!("Deep copy into a `{type_name}`.");

    Ok(quote! {
        impl ::hdds_cdr::native::NativeType for #name {
            type View<'a> = #view<'a>;

            fn write_native<N: ::hdds_cdr::native::NativeSink>(
                &self,
                sink: &mut N,
                at: usize,
                layout: &::hdds_cdr::native::NativeLayout,
            ) -> ::hdds_cdr::Result<()> {
                #(#writes)*
                ::core::result::Result::Ok(())
            }

            fn view<'a>(value: ::hdds_cdr::view::ValueView<'a>) -> ::hdds_cdr::Result<#view<'a>> {
                #view::from_struct(value.as_struct()?)
            }

            fn read_native(value: ::hdds_cdr::view::ValueView<'_>) -> ::hdds_cdr::Result<Self> {
                #view::from_struct(value.as_struct()?)?.to_owned()
            }
        }

        #[doc = #view_doc]
        #[derive(Debug, Clone, Copy)]
        #[allow(dead_code)]
        #vis struct #view<'a> {
            inner: ::hdds_cdr::view::StructView<'a>,
        }

        #[allow(dead_code)]
        impl<'a> #view<'a> {
            /// View the struct at the start of `buf`.
            pub fn new(
                buf: &'a [u8],
                layout: &'a ::hdds_cdr::native::NativeLayout,
            ) -> ::hdds_cdr::Result<Self> {
                Self::from_struct(::hdds_cdr::view::StructView::new(buf, layout)?)
            }

            pub fn from_struct(inner: ::hdds_cdr::view::StructView<'a>) -> ::hdds_cdr::Result<Self> {
                if inner.type_name() != #type_name {
                    return ::core::result::Result::Err(::hdds_cdr::CdrError::InvalidValue(
                        ::std::format!("expected {}, found {}", #type_name, inner.type_name()),
                    ));
                }
                ::core::result::Result::Ok(Self { inner })
            }

            pub fn as_struct(&self) -> ::hdds_cdr::view::StructView<'a> {
                self.inner
            }

            #(#accessors)*

            #[doc = #owned_doc]
            pub fn to_owned(&self) -> ::hdds_cdr::Result<#name> {
                ::core::result::Result::Ok(#name { #(#owned),* })
            }
        }
    })
}

fn derive_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Cdr enums cannot be generic",
        ));
    }
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "Cdr enums need at least one variant",
        ));
    }
    let name = &input.ident;
    let type_name = name.to_string();

    let mut variants = Vec::new();
    let mut next = 0i64;
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Cdr enums must have unit variants only",
            ));
        }
        let value = match &variant.discriminant {
            Some((_, expr)) => int_literal(expr)?,
            None => next,
        };
        let Ok(value) = i32::try_from(value) else {
            return Err(syn::Error::new_spanned(
                variant,
                format!("enum value {value} does not fit in 32 bits"),
            ));
        };
        next = i64::from(value) + 1;
        variants.push((variant.ident.clone(), value));
    }

    let first = &variants[0].0;
    let to_wire: Vec<_> = variants
        .iter()
        .map(|(ident, value)| quote! { Self::#ident => #value, })
        .collect();
    let from_wire: Vec<_> = variants
        .iter()
        .map(|(ident, value)| quote! { #value => ::core::result::Result::Ok(Self::#ident), })
        .collect();
    let unknown = quote! {
        other => ::core::result::Result::Err(::hdds_cdr::CdrError::InvalidValue(
            ::std::format!("{} has no enumerator {}", #type_name, other),
        )),
    };
    let described = variants.iter().map(|(ident, value)| {
        let variant_name = ident.to_string();
        let value = i64::from(*value);
        quote! { ::hdds_cdr::dynamic::EnumVariant::new(#variant_name, #value) }
    });

    Ok(quote! {
        impl ::hdds_cdr::CdrEncode for #name {
            const PRIMITIVE_WIDTH: ::core::option::Option<usize> = ::core::option::Option::Some(4);

            fn encode<S: ::hdds_cdr::CdrSink>(&self, sink: &mut S) -> ::hdds_cdr::Result<()> {
                let value: i32 = match self {
                    #(#to_wire)*
                };
                sink.write_i32(value)
            }
        }

        impl ::hdds_cdr::CdrDecode for #name {
            fn decode(reader: &mut ::hdds_cdr::CdrReader<'_>) -> ::hdds_cdr::Result<Self> {
                match reader.read_i32()? {
                    #(#from_wire)*
                    #unknown
                }
            }

            fn absent() -> ::core::option::Option<Self> {
                ::core::option::Option::Some(Self::#first)
            }
        }

        impl ::hdds_cdr::native::NativeType for #name {
            type View<'a> = Self;

            fn write_native<N: ::hdds_cdr::native::NativeSink>(
                &self,
                sink: &mut N,
                at: usize,
                layout: &::hdds_cdr::native::NativeLayout,
            ) -> ::hdds_cdr::Result<()> {
                let value: i32 = match self {
                    #(#to_wire)*
                };
                ::hdds_cdr::native::write_enum(sink, at, layout, value)
            }

            fn view<'a>(value: ::hdds_cdr::view::ValueView<'a>) -> ::hdds_cdr::Result<Self> {
                Self::read_native(value)
            }

            fn read_native(value: ::hdds_cdr::view::ValueView<'_>) -> ::hdds_cdr::Result<Self> {
                match value.scalar::<i32>()? {
                    #(#from_wire)*
                    #unknown
                }
            }
        }

        impl ::hdds_cdr::DescribeType for #name {
            fn type_descriptor() -> ::std::sync::Arc<::hdds_cdr::dynamic::TypeDescriptor> {
                ::std::sync::Arc::new(::hdds_cdr::dynamic::TypeDescriptor::new(
                    #type_name,
                    ::hdds_cdr::dynamic::TypeKind::Enum(::hdds_cdr::dynamic::EnumDescriptor::new(
                        ::std::vec![#(#described),*],
                    )),
                ))
            }
        }
    })
}

fn type_extensibility(attrs: &[Attribute]) -> syn::Result<TokenStream2> {
    let mut kind = quote! { ::hdds_cdr::Extensibility::Appendable };
    for attr in attrs.iter().filter(|a| a.path().is_ident("cdr")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("final") {
                kind = quote! { ::hdds_cdr::Extensibility::Final };
            } else if meta.path.is_ident("appendable") {
                kind = quote! { ::hdds_cdr::Extensibility::Appendable };
            } else if meta.path.is_ident("mutable") {
                kind = quote! { ::hdds_cdr::Extensibility::Mutable };
            } else {
                return Err(meta.error("expected `final`, `appendable` or `mutable`"));
            }
            Ok(())
        })?;
    }
    Ok(kind)
}

#[derive(Default)]
struct MemberAttrs {
    id: Option<u32>,
    key: bool,
    default: bool,
    required: bool,
}

fn member_attrs(attrs: &[Attribute]) -> syn::Result<MemberAttrs> {
    let mut parsed = MemberAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("cdr")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                let lit: syn::LitInt = meta.value()?.parse()?;
                parsed.id = Some(lit.base10_parse()?);
            } else if meta.path.is_ident("key") {
                parsed.key = true;
            } else if meta.path.is_ident("default") {
                parsed.default = true;
            } else if meta.path.is_ident("required") {
                parsed.required = true;
            } else {
                return Err(meta.error("expected `id = N`, `key`, `default` or `required`"));
            }
            Ok(())
        })?;
        if parsed.default && parsed.required {
            return Err(syn::Error::new_spanned(
                attr,
                "a member cannot be both `default` and `required`",
            ));
        }
    }
    Ok(parsed)
}

/// `T` when `ty` is `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn int_literal(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => int_literal(expr).map(|v| -v),
        Expr::Group(group) => int_literal(&group.expr),
        _ => Err(syn::Error::new_spanned(
            expr,
            "enum discriminant must be an integer literal",
        )),
    }
}

/// Copy of `generics` with `bounds` added to every type parameter.
fn bounded(generics: &Generics, bounds: &[TokenStream2]) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        for bound in bounds {
            param.bounds.push(parse_quote!(#bound));
        }
    }
    generics
}

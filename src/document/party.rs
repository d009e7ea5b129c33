use crate::core::*;
use crate::xml::XmlElement;

/// Render a party's content under `tag` (`SellerParty` or `BuyerParty`).
pub(crate) fn party_element(tag: &str, party: &Party) -> XmlElement {
    let tax_identification = XmlElement::new("TaxIdentification")
        .text_child("PersonTypeCode", party.person_type_code())
        .text_child("ResidenceTypeCode", "R")
        .text_child("TaxIdentificationNumber", party.tax_number.as_str());

    let centres = (!party.centres.is_empty()).then(|| {
        XmlElement::new("AdministrativeCentres")
            .children_from(party.centres.iter().map(|c| centre_element(c, &party.address)))
    });

    let identity = match &party.identity {
        PartyIdentity::LegalEntity { registration } => {
            let registration = (!registration.is_empty()).then(|| {
                XmlElement::new("RegistrationData").children_from(
                    registration
                        .populated()
                        .into_iter()
                        .map(|(name, value)| XmlElement::with_text(name, value)),
                )
            });
            XmlElement::new("LegalEntity")
                .text_child("CorporateName", party.name.as_str())
                .opt_child(registration)
        }
        PartyIdentity::Individual {
            first_surname,
            last_surname,
        } => XmlElement::new("Individual")
            .text_child("Name", party.name.as_str())
            .text_child("FirstSurname", first_surname.as_str())
            .text_child("SecondSurname", last_surname.as_str()),
    };

    let identity = identity
        .child(address_element(&party.address))
        .opt_child(contact_element(&party.contact));

    XmlElement::new(tag)
        .child(tax_identification)
        .opt_child(centres)
        .child(identity)
}

/// `AddressInSpain` for `ESP`, `OverseasAddress` for every other country.
pub(crate) fn address_element(address: &Address) -> XmlElement {
    if address.is_in_spain() {
        XmlElement::new("AddressInSpain")
            .text_child("Address", address.address.as_str())
            .text_child("PostCode", address.post_code.as_str())
            .text_child("Town", address.town.as_str())
            .text_child("Province", address.province.as_str())
            .text_child("CountryCode", address.country_code.as_str())
    } else {
        XmlElement::new("OverseasAddress")
            .text_child("Address", address.address.as_str())
            .text_child(
                "PostCodeAndTown",
                format!("{} {}", address.post_code, address.town),
            )
            .text_child("Province", address.province.as_str())
            .text_child("CountryCode", address.country_code.as_str())
    }
}

fn centre_element(centre: &AdministrativeCentre, fallback: &Address) -> XmlElement {
    // all-or-nothing: one missing field means the party's whole address
    let address = centre
        .address
        .complete()
        .unwrap_or_else(|| fallback.clone());

    XmlElement::new("AdministrativeCentre")
        .text_child("CentreCode", centre.code.as_str())
        .text_child("RoleTypeCode", centre.role.code())
        .text_child("Name", centre.name.as_str())
        .opt_text_child("FirstSurname", centre.first_surname.as_deref())
        .opt_text_child("SecondSurname", centre.last_surname.as_deref())
        .child(address_element(&address))
        .opt_text_child("CentreDescription", centre.description.as_deref())
}

fn contact_element(contact: &ContactDetails) -> Option<XmlElement> {
    let fields = contact.populated();
    if fields.is_empty() {
        return None;
    }
    Some(
        XmlElement::new("ContactDetails").children_from(
            fields
                .into_iter()
                .map(|(name, value)| XmlElement::with_text(name, value)),
        ),
    )
}
